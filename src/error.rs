//! Error types for the file-system cache
//!
//! Provides unified error handling using thiserror.

use std::path::PathBuf;

use thiserror::Error;

/// Boxed cause carried by read failures (I/O or envelope decoding).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// == Cache Error Enum ==
/// Unified error type for the cache engine.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A key-taking operation was given an empty key
    #[error("Path requires a cache key")]
    InvalidKey,

    /// The configured base path exists but is not a directory
    #[error("The base path '{}' is a file. It should be a folder", .path.display())]
    InvalidBasePath { path: PathBuf },

    /// The configured extension would break namespace-scoped scans
    #[error("Invalid file extension: {0}")]
    InvalidExtension(String),

    /// The configured hash algorithm is not available
    #[error("Hash does not exist: {0}")]
    UnsupportedHash(String),

    /// A batch item has no key or no value
    #[error("Save item {index} not valid, must be a {{key, value}} object")]
    InvalidSaveItem { index: usize },

    /// Reading or decoding an entry failed for a reason other than not-found
    #[error("Failed to read cache value at: {}. {source}", .path.display())]
    ReadFailure {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    /// Writing an entry failed
    #[error("Failed to write cache value at: {}. {source}", .path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Creating the base directory failed
    #[error("Failed to create cache directory: {}. {source}", .path.display())]
    DirectoryCreateFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Deleting an entry failed for a reason other than not-found
    #[error("Failed to remove cache value at: {}. {source}", .path.display())]
    RemoveFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CacheError {
    pub(crate) fn read(path: impl Into<PathBuf>, source: impl Into<BoxError>) -> Self {
        CacheError::ReadFailure {
            path: path.into(),
            source: source.into(),
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;
