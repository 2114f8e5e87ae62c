//! Configuration Module
//!
//! Construction options for a cache instance, settable in code or loaded
//! from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde_json::Value;

use crate::cache::{DEFAULT_BASE_PATH, DEFAULT_HASH};

/// Options a `FileSystemCache` is built from.
///
/// Every field is optional. Unset fields fall back to the defaults listed on
/// each setter.
#[derive(Debug, Clone, Default)]
pub struct CacheOptions {
    /// Directory entries are stored in
    pub base_path: Option<PathBuf>,
    /// Value(s) hashed into the namespace token
    pub namespace: Option<Value>,
    /// File suffix appended to every entry name
    pub extension: Option<String>,
    /// Default time-to-live for entries
    pub ttl: Option<Duration>,
    /// Digest algorithm identifier
    pub hash: Option<String>,
}

impl CacheOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `FS_CACHE_BASE_PATH` - Storage directory (default: `./.cache`)
    /// - `FS_CACHE_NS` - Namespace value (default: none)
    /// - `FS_CACHE_EXTENSION` - File extension (default: none)
    /// - `FS_CACHE_TTL` - Default TTL in seconds, fractions allowed (default: 0, never expires)
    /// - `FS_CACHE_HASH` - Hash algorithm (default: sha1)
    pub fn from_env() -> Self {
        Self {
            base_path: non_empty_var("FS_CACHE_BASE_PATH").map(PathBuf::from),
            namespace: non_empty_var("FS_CACHE_NS").map(Value::String),
            extension: non_empty_var("FS_CACHE_EXTENSION"),
            ttl: non_empty_var("FS_CACHE_TTL")
                .and_then(|v| v.parse::<f64>().ok())
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok()),
            hash: non_empty_var("FS_CACHE_HASH"),
        }
    }

    /// Storage directory. Relative paths resolve against the working
    /// directory. Default: `./.cache`.
    pub fn base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// A single value, or array of values, naming a namespace that isolates
    /// this cache from others sharing the directory. Default: none.
    pub fn namespace(mut self, ns: impl Into<Value>) -> Self {
        self.namespace = Some(ns.into());
        self
    }

    /// Extension for entry files, with or without the leading dot.
    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    /// Default TTL for entries written without one. Default: zero, never expires.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Hash algorithm used for keys and namespace. Default: `sha1`.
    pub fn hash(mut self, algorithm: impl Into<String>) -> Self {
        self.hash = Some(algorithm.into());
        self
    }

    pub(crate) fn base_path_or_default(&self) -> PathBuf {
        self.base_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BASE_PATH))
    }

    pub(crate) fn hash_or_default(&self) -> &str {
        self.hash.as_deref().unwrap_or(DEFAULT_HASH)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
