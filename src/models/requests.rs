//! Request models for batch cache operations
//!
//! Defines the items accepted by `FileSystemCache::save`.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::cache::CacheValue;

/// One `{key, value}` pair of a batch save.
///
/// Missing fields deserialize to an empty key and a null value, which
/// `is_valid` then rejects.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SaveItem {
    /// The cache key
    #[serde(default, deserialize_with = "key_from_scalar")]
    pub key: String,
    /// The value to store
    #[serde(default)]
    pub value: CacheValue,
}

impl SaveItem {
    pub fn new(key: impl Into<String>, value: impl Into<CacheValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// An item needs a non-empty key and a truthy value, so `0`, `false`
    /// and `""` are rejected along with `null`.
    pub fn is_valid(&self) -> bool {
        !self.key.is_empty() && self.value.is_truthy()
    }
}

// Keys may arrive as JSON numbers; they hash the same as their string form.
fn key_from_scalar<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "cache key must be a string or number, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_save_item_deserialize() {
        let item: SaveItem = serde_json::from_str(r#"{"key": "a", "value": {"b": 1}}"#).unwrap();
        assert_eq!(item.key, "a");
        assert_eq!(item.value, CacheValue::Json(json!({"b": 1})));
        assert!(item.is_valid());
    }

    #[test]
    fn test_numeric_key() {
        let item: SaveItem = serde_json::from_str(r#"{"key": 1, "value": "x"}"#).unwrap();
        assert_eq!(item.key, "1");
        assert!(item.is_valid());
    }

    #[test]
    fn test_empty_object_is_invalid() {
        let item: SaveItem = serde_json::from_str("{}").unwrap();
        assert!(!item.is_valid());
    }

    #[test]
    fn test_missing_value_is_invalid() {
        let item: SaveItem = serde_json::from_str(r#"{"key": 1}"#).unwrap();
        assert!(!item.is_valid());
        assert!(!SaveItem::new("", "x").is_valid());
    }

    #[test]
    fn test_falsy_values_are_invalid() {
        assert!(!SaveItem::new("a", 0i64).is_valid());
        assert!(!SaveItem::new("a", false).is_valid());
        assert!(!SaveItem::new("a", "").is_valid());
        assert!(SaveItem::new("a", 1i64).is_valid());
        assert!(SaveItem::new("a", json!([])).is_valid());
    }

    #[test]
    fn test_object_key_rejected() {
        let result = serde_json::from_str::<SaveItem>(r#"{"key": {"nested": 1}, "value": 2}"#);
        assert!(result.is_err());
    }
}
