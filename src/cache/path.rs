//! Path Composition Module
//!
//! Builds entry filenames from tokens and decides which directory entries
//! belong to a namespace.

use std::path::{Path, PathBuf};

use crate::cache::NAMESPACE_SEPARATOR;
use crate::error::{CacheError, Result};

/// Composes `base/[namespace-]key[.extension]`.
///
/// An empty key token means the caller passed no key.
pub fn build_path(
    base_path: &Path,
    namespace: Option<&str>,
    key_token: &str,
    extension: Option<&str>,
) -> Result<PathBuf> {
    if key_token.is_empty() {
        return Err(CacheError::InvalidKey);
    }

    let mut name = match namespace {
        Some(ns) => format!("{}{}{}", ns, NAMESPACE_SEPARATOR, key_token),
        None => key_token.to_string(),
    };
    if let Some(ext) = extension {
        name.push('.');
        name.push_str(ext);
    }

    Ok(base_path.join(name))
}

/// Strips one leading dot; an empty result means no extension.
pub fn normalize_extension(extension: &str) -> Option<String> {
    let ext = extension.strip_prefix('.').unwrap_or(extension);
    (!ext.is_empty()).then(|| ext.to_string())
}

/// Whether a directory entry name belongs to the given namespace scope.
///
/// Namespaced caches own names starting with `token-`. A cache without a
/// namespace owns every name that has no separator at all. Dot-prefixed
/// names are in-flight temporary files and belong to nobody.
pub fn in_scope(name: &str, namespace: Option<&str>) -> bool {
    if name.is_empty() || name.starts_with('.') {
        return false;
    }
    match namespace {
        Some(ns) => name
            .strip_prefix(ns)
            .is_some_and(|rest| rest.starts_with(NAMESPACE_SEPARATOR)),
        None => !name.contains(NAMESPACE_SEPARATOR),
    }
}
