//! Cache Entry Module
//!
//! Defines the on-disk envelope wrapped around every stored value, with TTL
//! support and explicit type tagging for values JSON cannot carry natively.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::cache::CacheValue;

// == Entry Kind ==
/// What kind of value an envelope holds, decided when it is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    /// Null, boolean, number or string.
    Primitive,
    /// Array or object.
    Json,
    /// A timestamp stored as an RFC 3339 string.
    Date,
}

// == Decode Error ==
/// Reasons an envelope cannot produce a value.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The entry outlived its TTL. Never surfaced to cache callers.
    #[error("Cache item has expired")]
    Expired,

    #[error("Malformed cache entry: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Invalid date in cache entry: {0}")]
    InvalidDate(String),
}

// == Cache Entry ==
/// Represents a single stored entry with its value and metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// The stored value, in its JSON form
    pub value: Value,
    /// How to rebuild `value` on read
    pub type_tag: EntryKind,
    /// Write timestamp
    pub created_at: DateTime<Utc>,
    /// Time to live in seconds, zero or less = no expiration
    pub ttl: f64,
}

impl CacheEntry {
    // == Constructor ==
    /// Wraps a value, stamping it with the current time.
    pub fn new(value: CacheValue, ttl: Duration) -> Self {
        let (value, type_tag) = match value {
            CacheValue::Date(date) => (Value::String(date.to_rfc3339()), EntryKind::Date),
            CacheValue::Json(value @ (Value::Array(_) | Value::Object(_))) => {
                (value, EntryKind::Json)
            }
            CacheValue::Json(value) => (value, EntryKind::Primitive),
        };

        Self {
            value,
            type_tag,
            created_at: Utc::now(),
            ttl: ttl.as_secs_f64(),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry expires once strictly more than `ttl` seconds have elapsed
    /// since it was written. Entries with a TTL of zero never expire.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        if self.ttl <= 0.0 {
            return false;
        }
        let elapsed = (now - self.created_at).num_milliseconds() as f64 / 1000.0;
        elapsed > self.ttl
    }

    // == Into Value ==
    /// Rebuilds the stored value, failing with `Expired` if it is stale.
    pub fn into_value(self) -> Result<CacheValue, DecodeError> {
        if self.is_expired() {
            return Err(DecodeError::Expired);
        }

        match self.type_tag {
            EntryKind::Date => {
                let text = match &self.value {
                    Value::String(text) => text,
                    other => return Err(DecodeError::InvalidDate(other.to_string())),
                };
                DateTime::parse_from_rfc3339(text)
                    .map(|date| CacheValue::Date(date.with_timezone(&Utc)))
                    .map_err(|e| DecodeError::InvalidDate(format!("{}: {}", text, e)))
            }
            EntryKind::Primitive | EntryKind::Json => Ok(CacheValue::Json(self.value)),
        }
    }
}

// == Envelope Encode/Decode ==
/// Serializes a value and its TTL into the on-disk JSON document.
pub fn encode(value: CacheValue, ttl: Duration) -> serde_json::Result<String> {
    serde_json::to_string(&CacheEntry::new(value, ttl))
}

/// Parses an on-disk JSON document back into its value.
pub fn decode(raw: &[u8]) -> Result<CacheValue, DecodeError> {
    let entry: CacheEntry = serde_json::from_slice(raw)?;
    entry.into_value()
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_kinds() {
        let ttl = Duration::ZERO;
        assert_eq!(CacheEntry::new(json!(1).into(), ttl).type_tag, EntryKind::Primitive);
        assert_eq!(CacheEntry::new(json!("a").into(), ttl).type_tag, EntryKind::Primitive);
        assert_eq!(CacheEntry::new(json!({"a": 1}).into(), ttl).type_tag, EntryKind::Json);
        assert_eq!(CacheEntry::new(json!([1, 2]).into(), ttl).type_tag, EntryKind::Json);
        assert_eq!(CacheEntry::new(Utc::now().into(), ttl).type_tag, EntryKind::Date);
    }

    #[test]
    fn test_encoded_field_names() {
        let raw = encode(CacheValue::from("bar"), Duration::from_secs(10)).unwrap();
        let doc: Value = serde_json::from_str(&raw).unwrap();

        assert_eq!(doc["value"], json!("bar"));
        assert_eq!(doc["typeTag"], json!("Primitive"));
        assert_eq!(doc["ttl"], json!(10.0));
        assert!(doc["createdAt"].is_string());
    }

    #[test]
    fn test_decode_date() {
        let now = Utc::now();
        let raw = encode(CacheValue::from(now), Duration::ZERO).unwrap();
        assert_eq!(decode(raw.as_bytes()).unwrap(), CacheValue::Date(now));
    }

    #[test]
    fn test_decode_json() {
        let value = json!({"foo": [1, 2, {"bar": null}]});
        let raw = encode(value.clone().into(), Duration::ZERO).unwrap();
        assert_eq!(decode(raw.as_bytes()).unwrap(), CacheValue::Json(value));
    }

    #[test]
    fn test_decode_malformed() {
        assert!(matches!(decode(b"not json"), Err(DecodeError::Malformed(_))));
        assert!(matches!(decode(br#"{"value": 1}"#), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn test_decode_bad_date() {
        let raw = r#"{"value":"yesterday","typeTag":"Date","createdAt":"2024-01-01T00:00:00Z","ttl":0}"#;
        assert!(matches!(decode(raw.as_bytes()), Err(DecodeError::InvalidDate(_))));
    }

    #[test]
    fn test_decode_expired() {
        let raw = r#"{"value":1,"typeTag":"Primitive","createdAt":"2000-01-01T00:00:00Z","ttl":5}"#;
        assert!(matches!(decode(raw.as_bytes()), Err(DecodeError::Expired)));
    }

    #[test]
    fn test_zero_ttl_never_expires() {
        let mut entry = CacheEntry::new(json!(1).into(), Duration::ZERO);
        entry.created_at = DateTime::parse_from_rfc3339("1970-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert!(!entry.is_expired());

        entry.ttl = -1.0;
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = CacheEntry::new(json!(1).into(), Duration::from_secs(10));
        let at_ttl = entry.created_at + chrono::Duration::seconds(10);
        let past_ttl = at_ttl + chrono::Duration::milliseconds(1);

        // Expiry requires strictly more than the TTL to have elapsed
        assert!(!entry.is_expired_at(at_ttl));
        assert!(entry.is_expired_at(past_ttl));
    }

    #[test]
    fn test_fractional_ttl() {
        let entry = CacheEntry::new(json!(1).into(), Duration::from_millis(300));
        assert!((entry.ttl - 0.3).abs() < f64::EPSILON);
        assert!(!entry.is_expired_at(entry.created_at + chrono::Duration::milliseconds(300)));
        assert!(entry.is_expired_at(entry.created_at + chrono::Duration::milliseconds(301)));
    }
}
