//! Cache Value Module
//!
//! The payload type stored in and returned from the cache.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

// == Cache Value ==
/// A value that can be written to and rehydrated from a cache entry.
///
/// Anything JSON can represent goes in `Json`. Dates are kept apart so they
/// come back as `DateTime<Utc>` rather than as the string they are stored as.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheValue {
    Json(Value),
    Date(DateTime<Utc>),
}

impl CacheValue {
    /// Serializes any `Serialize` type into a JSON value.
    pub fn from_serializable<T: Serialize>(value: &T) -> serde_json::Result<Self> {
        serde_json::to_value(value).map(CacheValue::Json)
    }

    /// Deserializes the value into a concrete type.
    pub fn deserialize_into<T: DeserializeOwned>(self) -> serde_json::Result<T> {
        serde_json::from_value(self.into_json())
    }

    /// Returns the JSON payload, if this is not a date.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            CacheValue::Json(value) => Some(value),
            CacheValue::Date(_) => None,
        }
    }

    pub fn as_date(&self) -> Option<&DateTime<Utc>> {
        match self {
            CacheValue::Date(date) => Some(date),
            CacheValue::Json(_) => None,
        }
    }

    /// JSON form of the value; dates become RFC 3339 strings.
    pub fn into_json(self) -> Value {
        match self {
            CacheValue::Json(value) => value,
            CacheValue::Date(date) => Value::String(date.to_rfc3339()),
        }
    }

    /// Whether the value is absent (JSON `null`).
    pub fn is_null(&self) -> bool {
        matches!(self, CacheValue::Json(Value::Null))
    }

    /// False for `null`, `false`, numeric zero and the empty string.
    /// Dates, arrays and objects are always truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            CacheValue::Date(_) => true,
            CacheValue::Json(Value::Null) => false,
            CacheValue::Json(Value::Bool(b)) => *b,
            CacheValue::Json(Value::Number(n)) => n.as_f64() != Some(0.0),
            CacheValue::Json(Value::String(s)) => !s.is_empty(),
            CacheValue::Json(_) => true,
        }
    }
}

impl Default for CacheValue {
    fn default() -> Self {
        CacheValue::Json(Value::Null)
    }
}

impl From<Value> for CacheValue {
    fn from(value: Value) -> Self {
        CacheValue::Json(value)
    }
}

impl From<DateTime<Utc>> for CacheValue {
    fn from(date: DateTime<Utc>) -> Self {
        CacheValue::Date(date)
    }
}

impl Serialize for CacheValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CacheValue::Json(value) => value.serialize(serializer),
            CacheValue::Date(date) => serializer.serialize_str(&date.to_rfc3339()),
        }
    }
}

// Untagged input is always plain JSON; only envelopes know about dates.
impl<'de> Deserialize<'de> for CacheValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(CacheValue::Json)
    }
}

macro_rules! impl_from_json {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for CacheValue {
                fn from(value: $ty) -> Self {
                    CacheValue::Json(Value::from(value))
                }
            }
        )*
    };
}

impl_from_json!(&str, String, bool, i32, i64, u32, u64, f64);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[test]
    fn test_from_scalars() {
        assert_eq!(CacheValue::from("text"), CacheValue::Json(json!("text")));
        assert_eq!(CacheValue::from(42i64), CacheValue::Json(json!(42)));
        assert_eq!(CacheValue::from(true), CacheValue::Json(json!(true)));
    }

    #[test]
    fn test_serializable_round_trip() {
        let value = CacheValue::from_serializable(&Point { x: 1, y: 2 }).unwrap();
        assert_eq!(value.as_json(), Some(&json!({"x": 1, "y": 2})));

        let point: Point = value.deserialize_into().unwrap();
        assert_eq!(point, Point { x: 1, y: 2 });
    }

    #[test]
    fn test_date_accessors() {
        let now = Utc::now();
        let value = CacheValue::from(now);
        assert_eq!(value.as_date(), Some(&now));
        assert!(value.as_json().is_none());
        assert_eq!(value.into_json(), json!(now.to_rfc3339()));
    }

    #[test]
    fn test_serde_forms() {
        let date = Utc::now();
        let serialized = serde_json::to_value(CacheValue::from(date)).unwrap();
        assert_eq!(serialized, json!(date.to_rfc3339()));

        let parsed: CacheValue = serde_json::from_str(r#"{"a": [1, 2]}"#).unwrap();
        assert_eq!(parsed, CacheValue::Json(json!({"a": [1, 2]})));
    }

    #[test]
    fn test_truthiness() {
        for falsy in [json!(null), json!(false), json!(0), json!(0.0), json!(-0.0), json!("")] {
            assert!(!CacheValue::Json(falsy.clone()).is_truthy(), "{falsy}");
        }
        for truthy in [json!(true), json!(1), json!(-0.5), json!("0"), json!([]), json!({})] {
            assert!(CacheValue::Json(truthy.clone()).is_truthy(), "{truthy}");
        }
        assert!(CacheValue::from(Utc::now()).is_truthy());
    }

    #[test]
    fn test_default_is_null() {
        assert!(CacheValue::default().is_null());
        assert!(!CacheValue::from(0i64).is_null());
    }
}
