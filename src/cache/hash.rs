//! Key Hashing Module
//!
//! Turns caller-supplied keys and namespace values into hex digest tokens.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};

use crate::error::CacheError;

// == Hash Algorithm ==
/// Digest functions available for namespace and key hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HashAlgorithm {
    /// SHA-1, 40 hex characters.
    #[default]
    Sha1,
    /// SHA-256, 64 hex characters.
    Sha256,
    /// SHA-512, 128 hex characters.
    Sha512,
}

impl HashAlgorithm {
    /// Every supported algorithm.
    pub const ALL: [HashAlgorithm; 3] = [Self::Sha1, Self::Sha256, Self::Sha512];

    /// Canonical identifier, as accepted by `FromStr`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }

    /// Length of a token produced by this algorithm.
    pub fn hex_length(&self) -> usize {
        match self {
            Self::Sha1 => 40,
            Self::Sha256 => 64,
            Self::Sha512 => 128,
        }
    }

    fn digest_hex<'a>(&self, parts: impl Iterator<Item = &'a str>) -> String {
        match self {
            Self::Sha1 => feed::<Sha1>(parts),
            Self::Sha256 => feed::<Sha256>(parts),
            Self::Sha512 => feed::<Sha512>(parts),
        }
    }
}

fn feed<'a, D: Digest>(parts: impl Iterator<Item = &'a str>) -> String {
    let mut hasher = D::new();
    for part in parts {
        hasher.update(part.as_bytes());
    }
    hex::encode(hasher.finalize())
}

impl FromStr for HashAlgorithm {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sha1" | "sha-1" => Ok(Self::Sha1),
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "sha512" | "sha-512" => Ok(Self::Sha512),
            _ => Err(CacheError::UnsupportedHash(s.to_string())),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// == Derive Key Token ==
/// Hashes a set of values into a single hex token.
///
/// Arrays are flattened (recursively), nulls and empty strings are dropped,
/// and the remaining values are fed to the digest in order as strings.
/// Returns `None` when nothing is left to hash, which is how "no namespace"
/// is represented.
pub fn derive_key_token<I>(algorithm: HashAlgorithm, values: I) -> Option<String>
where
    I: IntoIterator,
    I::Item: Into<Value>,
{
    let mut parts = Vec::new();
    for value in values {
        flatten_into(value.into(), &mut parts);
    }
    if parts.is_empty() {
        return None;
    }
    Some(algorithm.digest_hex(parts.iter().map(String::as_str)))
}

/// Hashes a single key string.
pub fn hash_key(algorithm: HashAlgorithm, key: &str) -> String {
    algorithm.digest_hex(std::iter::once(key))
}

fn flatten_into(value: Value, parts: &mut Vec<String>) {
    match value {
        Value::Null => {}
        Value::Array(items) => {
            for item in items {
                flatten_into(item, parts);
            }
        }
        Value::String(s) if s.is_empty() => {}
        Value::String(s) => parts.push(s),
        other => parts.push(other.to_string()),
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SHA1_FOO: &str = "0beec7b5ea3f0fdbc95d0dd47f3c5bc275da8a33";

    #[test]
    fn test_parse_algorithms() {
        assert_eq!("sha1".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha1);
        assert_eq!("SHA-256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha256);
        assert_eq!("sha512".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha512);
    }

    #[test]
    fn test_parse_unsupported() {
        let result = "404-no-exist".parse::<HashAlgorithm>();
        assert!(matches!(result, Err(CacheError::UnsupportedHash(ref name)) if name == "404-no-exist"));
    }

    #[test]
    fn test_name_round_trips_through_parse() {
        for algorithm in HashAlgorithm::ALL {
            assert_eq!(algorithm.name().parse::<HashAlgorithm>().unwrap(), algorithm);
        }
    }

    #[test]
    fn test_hash_key_known_digest() {
        assert_eq!(hash_key(HashAlgorithm::Sha1, "foo"), SHA1_FOO);
    }

    #[test]
    fn test_token_lengths() {
        for algorithm in HashAlgorithm::ALL {
            assert_eq!(hash_key(algorithm, "foo").len(), algorithm.hex_length());
        }
    }

    #[test]
    fn test_derive_token_single_value_matches_key_hash() {
        let token = derive_key_token(HashAlgorithm::Sha1, ["foo"]).unwrap();
        assert_eq!(token, SHA1_FOO);
    }

    #[test]
    fn test_derive_token_concatenates_parts() {
        let parts = derive_key_token(HashAlgorithm::Sha256, [json!("foo"), json!(123)]);
        let joined = hash_key(HashAlgorithm::Sha256, "foo123");
        assert_eq!(parts.unwrap(), joined);
    }

    #[test]
    fn test_derive_token_flattens_nested_arrays() {
        let nested = derive_key_token(HashAlgorithm::Sha1, [json!([1, [2, [3]]])]);
        let flat = derive_key_token(HashAlgorithm::Sha1, [json!(1), json!(2), json!(3)]);
        assert_eq!(nested, flat);
    }

    #[test]
    fn test_derive_token_empty_is_none() {
        assert!(derive_key_token(HashAlgorithm::Sha1, Vec::<Value>::new()).is_none());
        assert!(derive_key_token(HashAlgorithm::Sha1, [Value::Null, json!(""), json!([])]).is_none());
    }

    #[test]
    fn test_derive_token_skips_missing_values() {
        let with_nulls = derive_key_token(HashAlgorithm::Sha1, [json!(null), json!("foo"), json!(null)]);
        assert_eq!(with_nulls.as_deref(), Some(SHA1_FOO));
    }
}
