//! Immutable config trees with indifferent key access.
//!
//! Every mapping key is normalized to a string when the tree is built, so a
//! YAML key written as `404`, `"404"` or `true` is found by the text it reads
//! as. Lookups accept `&str`, `String` and [`ConfigName`] interchangeably;
//! sequences are indexed by `usize`. Missing entries index to [`ConfigValue::Null`]:
//!
//! ```
//! use lite_config::ConfigValue;
//! use lite_config::ConfigName;
//!
//! let doc: serde_yaml::Value = serde_yaml::from_str("top: {list: [{fu: schnickens}]}").unwrap();
//! let cfg = ConfigValue::from(doc);
//! assert_eq!(cfg["top"]["list"][0]["fu"], "schnickens");
//! assert_eq!(cfg[ConfigName::new("top")]["list"][0]["fu"], "schnickens");
//! assert!(cfg["top"]["missing"]["deeper"].is_null());
//! ```

use crate::name::ConfigName;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Number;
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::ops::Index;

static NULL: ConfigValue = ConfigValue::Null;

/// A node of a loaded config.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Sequence(Vec<ConfigValue>),
    Mapping(ConfigMap),
}

/// A mapping with string keys, ordered by key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ConfigMap(BTreeMap<String, ConfigValue>);

impl ConfigMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<I: ConfigIndex + ?Sized>(&self, key: &I) -> Option<&ConfigValue> {
        key.key().and_then(|k| self.0.get(k))
    }

    pub fn contains_key<I: ConfigIndex + ?Sized>(&self, key: &I) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, ConfigValue> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn insert(&mut self, key: String, value: ConfigValue) {
        self.0.insert(key, value);
    }

    pub(crate) fn remove(&mut self, key: &str) -> Option<ConfigValue> {
        self.0.remove(key)
    }

    pub(crate) fn into_entries(self) -> btree_map::IntoIter<String, ConfigValue> {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ConfigMap {
    type Item = (&'a String, &'a ConfigValue);
    type IntoIter = btree_map::Iter<'a, String, ConfigValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(String, ConfigValue)> for ConfigMap {
    fn from_iter<T: IntoIterator<Item = (String, ConfigValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl ConfigValue {
    /// Look up a mapping key or sequence position.
    pub fn get<I: ConfigIndex>(&self, index: I) -> Option<&ConfigValue> {
        index.index_into(self)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ConfigValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            ConfigValue::Number(n) => n.as_u64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigValue::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[ConfigValue]> {
        match self {
            ConfigValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&ConfigMap> {
        match self {
            ConfigValue::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Plain JSON view of this tree.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ConfigValue::Null => serde_json::Value::Null,
            ConfigValue::Bool(b) => serde_json::Value::Bool(*b),
            ConfigValue::Number(n) => serde_json::Value::Number(n.clone()),
            ConfigValue::String(s) => serde_json::Value::String(s.clone()),
            ConfigValue::Sequence(items) => {
                serde_json::Value::Array(items.iter().map(ConfigValue::to_json).collect())
            }
            ConfigValue::Mapping(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }

    /// Deserialize this tree into a caller-defined type.
    pub fn deserialize<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_value(self.to_json())
    }
}

/// Types usable as a lookup key into a [`ConfigValue`].
///
/// Sealed: implemented for `str`, `String`, [`ConfigName`] and `usize`.
pub trait ConfigIndex: private::Sealed {
    #[doc(hidden)]
    fn index_into<'v>(&self, value: &'v ConfigValue) -> Option<&'v ConfigValue>;

    #[doc(hidden)]
    fn key(&self) -> Option<&str>;
}

mod private {
    pub trait Sealed {}
    impl Sealed for str {}
    impl Sealed for String {}
    impl Sealed for crate::name::ConfigName {}
    impl Sealed for usize {}
    impl<T: ?Sized + Sealed> Sealed for &T {}
}

fn index_by_key<'v>(key: &str, value: &'v ConfigValue) -> Option<&'v ConfigValue> {
    match value {
        ConfigValue::Mapping(map) => map.0.get(key),
        _ => None,
    }
}

impl ConfigIndex for str {
    fn index_into<'v>(&self, value: &'v ConfigValue) -> Option<&'v ConfigValue> {
        index_by_key(self, value)
    }

    fn key(&self) -> Option<&str> {
        Some(self)
    }
}

impl ConfigIndex for String {
    fn index_into<'v>(&self, value: &'v ConfigValue) -> Option<&'v ConfigValue> {
        index_by_key(self, value)
    }

    fn key(&self) -> Option<&str> {
        Some(self)
    }
}

impl ConfigIndex for ConfigName {
    fn index_into<'v>(&self, value: &'v ConfigValue) -> Option<&'v ConfigValue> {
        index_by_key(self.as_str(), value)
    }

    fn key(&self) -> Option<&str> {
        Some(self.as_str())
    }
}

impl ConfigIndex for usize {
    fn index_into<'v>(&self, value: &'v ConfigValue) -> Option<&'v ConfigValue> {
        match value {
            ConfigValue::Sequence(items) => items.get(*self),
            _ => None,
        }
    }

    fn key(&self) -> Option<&str> {
        None
    }
}

impl<T: ConfigIndex + ?Sized> ConfigIndex for &T {
    fn index_into<'v>(&self, value: &'v ConfigValue) -> Option<&'v ConfigValue> {
        (**self).index_into(value)
    }

    fn key(&self) -> Option<&str> {
        (**self).key()
    }
}

impl<I: ConfigIndex> Index<I> for ConfigValue {
    type Output = ConfigValue;

    fn index(&self, index: I) -> &ConfigValue {
        index.index_into(self).unwrap_or(&NULL)
    }
}

impl PartialEq<str> for ConfigValue {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == Some(other)
    }
}

impl PartialEq<&str> for ConfigValue {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

impl PartialEq<String> for ConfigValue {
    fn eq(&self, other: &String) -> bool {
        self.as_str() == Some(other.as_str())
    }
}

impl PartialEq<bool> for ConfigValue {
    fn eq(&self, other: &bool) -> bool {
        self.as_bool() == Some(*other)
    }
}

impl PartialEq<i64> for ConfigValue {
    fn eq(&self, other: &i64) -> bool {
        self.as_i64() == Some(*other)
    }
}

impl From<serde_yaml::Value> for ConfigValue {
    fn from(value: serde_yaml::Value) -> Self {
        use serde_yaml::Value as Yaml;

        match value {
            Yaml::Null => ConfigValue::Null,
            Yaml::Bool(b) => ConfigValue::Bool(b),
            Yaml::Number(n) => yaml_number(&n),
            Yaml::String(s) => ConfigValue::String(s),
            Yaml::Sequence(items) => {
                ConfigValue::Sequence(items.into_iter().map(ConfigValue::from).collect())
            }
            Yaml::Mapping(map) => ConfigValue::Mapping(
                map.into_iter()
                    .map(|(k, v)| (normalize_key(k), ConfigValue::from(v)))
                    .collect(),
            ),
            Yaml::Tagged(tagged) => ConfigValue::from(tagged.value),
        }
    }
}

impl From<serde_json::Value> for ConfigValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match value {
            Json::Null => ConfigValue::Null,
            Json::Bool(b) => ConfigValue::Bool(b),
            Json::Number(n) => ConfigValue::Number(n),
            Json::String(s) => ConfigValue::String(s),
            Json::Array(items) => {
                ConfigValue::Sequence(items.into_iter().map(ConfigValue::from).collect())
            }
            Json::Object(map) => ConfigValue::Mapping(
                map.into_iter()
                    .map(|(k, v)| (k, ConfigValue::from(v)))
                    .collect(),
            ),
        }
    }
}

/// JSON numbers cannot hold `.inf`/`.nan`; those keep their YAML spelling.
fn yaml_number(n: &serde_yaml::Number) -> ConfigValue {
    let number = if let Some(i) = n.as_i64() {
        Some(Number::from(i))
    } else if let Some(u) = n.as_u64() {
        Some(Number::from(u))
    } else {
        n.as_f64().and_then(Number::from_f64)
    };

    match number {
        Some(number) => ConfigValue::Number(number),
        None => ConfigValue::String(n.to_string()),
    }
}

/// String form of a YAML mapping key.
fn normalize_key(key: serde_yaml::Value) -> String {
    use serde_yaml::Value as Yaml;

    match key {
        Yaml::String(s) => s,
        Yaml::Number(n) => n.to_string(),
        Yaml::Bool(b) => b.to_string(),
        Yaml::Null => "null".to_string(),
        Yaml::Tagged(tagged) => normalize_key(tagged.value),
        complex => serde_yaml::to_string(&complex)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}
