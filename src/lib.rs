//! fs_cache - A persistent file-system key/value cache
//!
//! Stores one JSON file per key under a base directory, with optional
//! namespaces, configurable key hashing and lazy TTL expiration.

pub mod cache;
pub mod config;
pub mod error;
pub mod models;

pub use cache::{CacheValue, FileSystemCache, HashAlgorithm};
pub use config::CacheOptions;
pub use error::{CacheError, Result};
pub use models::{LoadResponse, LoadedFile, SaveItem, SaveResponse};
