//! Deep merge of a local override onto a base config.
//!
//! Mappings are merged key by key; everything else, sequences and explicit
//! nulls included, is replaced by the override.

use crate::value::ConfigValue;

/// Deep merge two values, with `overlay` taking precedence over `base`.
///
/// - Mappings are merged recursively: keys in overlay override keys in base
/// - Sequences, strings, numbers, booleans and nulls are replaced entirely
///
/// # Example
/// ```
/// use lite_config::{ConfigValue, deep_merge};
/// use serde_json::json;
///
/// let base = ConfigValue::from(json!({"this": "A", "inner": {"one": "a", "two": "b"}}));
/// let overlay = ConfigValue::from(json!({"inner": {"one": "a-override"}}));
/// let merged = deep_merge(base, overlay);
/// assert_eq!(merged["inner"]["one"], "a-override");
/// assert_eq!(merged["inner"]["two"], "b");
/// assert_eq!(merged["this"], "A");
/// ```
pub fn deep_merge(base: ConfigValue, overlay: ConfigValue) -> ConfigValue {
    match (base, overlay) {
        (ConfigValue::Mapping(mut base_map), ConfigValue::Mapping(overlay_map)) => {
            for (key, overlay_value) in overlay_map.into_entries() {
                let merged_value = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged_value);
            }
            ConfigValue::Mapping(base_map)
        }
        (_, overlay) => overlay,
    }
}
