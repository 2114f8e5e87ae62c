//! Cache Module
//!
//! Provides a persistent file-system cache with namespaces and TTL expiration.

pub mod entry;
pub mod hash;
pub mod path;
mod store;
mod value;


// Re-export public types
pub use entry::{CacheEntry, DecodeError, EntryKind};
pub use hash::{derive_key_token, HashAlgorithm};
pub use store::FileSystemCache;
pub use value::CacheValue;

// == Public Constants ==
/// Base directory used when none is configured
pub const DEFAULT_BASE_PATH: &str = "./.cache";

/// Hash algorithm used when none is configured
pub const DEFAULT_HASH: &str = "sha1";

/// Joins the namespace token and key token in a filename
pub const NAMESPACE_SEPARATOR: char = '-';
