//! Interned config bundle names.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Identifier of a config bundle, e.g. `database` for `config/database.yml`.
///
/// Cheap to clone. Also usable as a lookup key into a
/// [`ConfigValue`](crate::ConfigValue), where it is equivalent to the same
/// text given as `&str`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConfigName(Arc<str>);

impl ConfigName {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ConfigName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ConfigName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ConfigName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ConfigName {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl From<&String> for ConfigName {
    fn from(name: &String) -> Self {
        Self::new(name)
    }
}

impl From<&ConfigName> for ConfigName {
    fn from(name: &ConfigName) -> Self {
        name.clone()
    }
}
