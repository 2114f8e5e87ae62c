//! Response models for batch cache operations
//!
//! Defines what `save` and `load` hand back.

use std::path::PathBuf;

use serde::Serialize;

use crate::cache::CacheValue;

/// Result of `FileSystemCache::save`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SaveResponse {
    /// Written paths, in input order
    pub paths: Vec<PathBuf>,
}

/// One live entry found by `FileSystemCache::load`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadedFile {
    pub path: PathBuf,
    pub value: CacheValue,
}

/// Result of `FileSystemCache::load`
///
/// Files appear in directory-listing order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadResponse {
    pub files: Vec<LoadedFile>,
}

impl LoadResponse {
    /// Finds the value loaded from a given path.
    pub fn value_at(&self, path: &std::path::Path) -> Option<&CacheValue> {
        self.files
            .iter()
            .find(|file| file.path == path)
            .map(|file| &file.value)
    }
}
