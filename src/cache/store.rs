//! Cache Store Module
//!
//! The file-system cache engine: one JSON envelope per key under a base
//! directory, with namespace scoping and lazy TTL expiration.

use std::io::{self, ErrorKind};
use std::path::{Component, Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::future::{join_all, try_join_all};
use tokio::fs;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::cache::entry::{self, DecodeError};
use crate::cache::hash::{derive_key_token, hash_key, HashAlgorithm};
use crate::cache::path::{build_path, in_scope, normalize_extension};
use crate::cache::{CacheValue, NAMESPACE_SEPARATOR};
use crate::config::CacheOptions;
use crate::error::{CacheError, Result};
use crate::models::{LoadResponse, LoadedFile, SaveItem, SaveResponse};

/// Uniquifies temporary file names within this process.
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

// == File System Cache ==
/// A cache that reads and writes entries under one directory.
///
/// Several instances, in this process or others, may share a directory.
/// There is no locking between them: concurrent writes to the same key race
/// and the last one wins.
#[derive(Debug)]
pub struct FileSystemCache {
    /// Absolute directory entries live in
    base_path: PathBuf,
    /// Namespace token, `None` when no namespace was configured
    namespace: Option<String>,
    /// Extension without its leading dot
    extension: Option<String>,
    /// Digest used for namespace and keys
    hash: HashAlgorithm,
    /// Default TTL for entries written without one
    ttl: Duration,
    /// Set once the base directory is known to exist
    base_path_ready: OnceCell<()>,
}

impl FileSystemCache {
    // == Constructor ==
    /// Creates a cache from the given options.
    ///
    /// Fails with `InvalidBasePath` if the base path exists and is not a
    /// directory, and with `UnsupportedHash` for an unknown algorithm. The
    /// directory itself is only created on first write.
    pub fn new(options: CacheOptions) -> Result<Self> {
        let base_path = resolve_base_path(options.base_path_or_default())?;
        if base_path.exists() && !base_path.is_dir() {
            return Err(CacheError::InvalidBasePath { path: base_path });
        }

        let hash: HashAlgorithm = options.hash_or_default().parse()?;

        let extension = match options.extension.as_deref().and_then(normalize_extension) {
            Some(ext) if ext.contains(NAMESPACE_SEPARATOR) || ext.contains(['/', '\\']) => {
                return Err(CacheError::InvalidExtension(ext));
            }
            ext => ext,
        };

        let namespace = options
            .namespace
            .and_then(|ns| derive_key_token(hash, [ns]));

        info!(
            base_path = %base_path.display(),
            namespace = namespace.as_deref().unwrap_or("-"),
            hash = %hash,
            "File system cache initialized"
        );

        Ok(Self {
            base_path,
            namespace,
            extension,
            hash,
            ttl: options.ttl.unwrap_or(Duration::ZERO),
            base_path_ready: OnceCell::new(),
        })
    }

    // == Accessors ==
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// The namespace token prefixed to every filename, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    pub fn hash(&self) -> HashAlgorithm {
        self.hash
    }

    /// Default TTL; zero means entries never expire.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // == Path ==
    /// Derives the file path for a key. Pure, no I/O.
    pub fn path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() {
            return Err(CacheError::InvalidKey);
        }
        build_path(
            &self.base_path,
            self.namespace.as_deref(),
            &hash_key(self.hash, key),
            self.extension.as_deref(),
        )
    }

    // == File Exists ==
    /// Whether a file exists for the key, regardless of expiry.
    pub async fn file_exists(&self, key: &str) -> Result<bool> {
        let path = self.path(key)?;
        fs::try_exists(&path)
            .await
            .map_err(|e| CacheError::read(path, e))
    }

    // == Ensure Base Path ==
    /// Creates the base directory if this instance has not done so yet.
    pub async fn ensure_base_path(&self) -> Result<()> {
        let base_path = self.base_path.as_path();
        self.base_path_ready
            .get_or_try_init(|| async move {
                fs::create_dir_all(base_path)
                    .await
                    .map_err(|source| CacheError::DirectoryCreateFailure {
                        path: base_path.to_path_buf(),
                        source,
                    })?;
                debug!(base_path = %base_path.display(), "Base path ready");
                Ok::<(), CacheError>(())
            })
            .await?;
        Ok(())
    }

    fn ensure_base_path_sync(&self) -> Result<()> {
        if self.base_path_ready.initialized() {
            return Ok(());
        }
        std::fs::create_dir_all(&self.base_path)
            .map_err(|source| self.directory_create_failure(source))?;
        // Losing the race to a concurrent initializer is fine.
        let _ = self.base_path_ready.set(());
        Ok(())
    }

    // == Get ==
    /// Reads the value stored under a key.
    ///
    /// Returns `None` when there is no entry or the entry has expired. An
    /// expired entry's file is deleted as part of the read.
    pub async fn get(&self, key: &str) -> Result<Option<CacheValue>> {
        let path = self.path(key)?;
        read_value(&path).await
    }

    /// Like `get`, substituting `default` for a missing or expired entry.
    pub async fn get_or(&self, key: &str, default: impl Into<CacheValue>) -> Result<CacheValue> {
        Ok(self.get(key).await?.unwrap_or_else(|| default.into()))
    }

    /// Blocking variant of `get`.
    ///
    /// Expired entries read as `None` but their files are left in place;
    /// the next async `get`, `load` or `clear` removes them.
    pub fn get_sync(&self, key: &str) -> Result<Option<CacheValue>> {
        let path = self.path(key)?;
        let raw = match std::fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::read(path, e)),
        };
        match entry::decode(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(DecodeError::Expired) => Ok(None),
            Err(e) => Err(CacheError::read(path, e)),
        }
    }

    pub fn get_sync_or(&self, key: &str, default: impl Into<CacheValue>) -> Result<CacheValue> {
        Ok(self.get_sync(key)?.unwrap_or_else(|| default.into()))
    }

    // == Set ==
    /// Writes a value under a key, returning the path written.
    ///
    /// `ttl` overrides the cache default for this entry only.
    pub async fn set(
        &self,
        key: &str,
        value: impl Into<CacheValue>,
        ttl: Option<Duration>,
    ) -> Result<PathBuf> {
        let path = self.path(key)?;
        let json = self.encode(&path, value.into(), ttl)?;
        self.ensure_base_path().await?;

        let temp = temp_path(&path);
        let mut written = fs::write(&temp, json.as_bytes()).await;
        if matches!(&written, Err(e) if e.kind() == ErrorKind::NotFound) {
            // Base directory removed behind our back
            fs::create_dir_all(&self.base_path)
                .await
                .map_err(|source| self.directory_create_failure(source))?;
            written = fs::write(&temp, json.as_bytes()).await;
        }
        if let Err(source) = written {
            return Err(CacheError::WriteFailure { path, source });
        }
        let renamed = fs::rename(&temp, &path).await;
        if let Err(source) = renamed {
            let _ = fs::remove_file(&temp).await;
            return Err(CacheError::WriteFailure { path, source });
        }

        debug!(path = %path.display(), "Cache entry written");
        Ok(path)
    }

    /// Blocking variant of `set`. Returns the cache for chaining.
    pub fn set_sync(
        &self,
        key: &str,
        value: impl Into<CacheValue>,
        ttl: Option<Duration>,
    ) -> Result<&Self> {
        let path = self.path(key)?;
        let json = self.encode(&path, value.into(), ttl)?;
        self.ensure_base_path_sync()?;

        let temp = temp_path(&path);
        let mut written = std::fs::write(&temp, json.as_bytes());
        if matches!(&written, Err(e) if e.kind() == ErrorKind::NotFound) {
            std::fs::create_dir_all(&self.base_path)
                .map_err(|source| self.directory_create_failure(source))?;
            written = std::fs::write(&temp, json.as_bytes());
        }
        if let Err(source) = written {
            return Err(CacheError::WriteFailure { path, source });
        }
        let renamed = std::fs::rename(&temp, &path);
        if let Err(source) = renamed {
            let _ = std::fs::remove_file(&temp);
            return Err(CacheError::WriteFailure { path, source });
        }

        debug!(path = %path.display(), "Cache entry written");
        Ok(self)
    }

    fn directory_create_failure(&self, source: io::Error) -> CacheError {
        CacheError::DirectoryCreateFailure {
            path: self.base_path.clone(),
            source,
        }
    }

    fn encode(&self, path: &Path, value: CacheValue, ttl: Option<Duration>) -> Result<String> {
        entry::encode(value, ttl.unwrap_or(self.ttl)).map_err(|e| CacheError::WriteFailure {
            path: path.to_path_buf(),
            source: io::Error::from(e),
        })
    }

    // == Remove ==
    /// Deletes the entry for a key. Removing a missing key is a no-op.
    pub async fn remove(&self, key: &str) -> Result<()> {
        let path = self.path(key)?;
        if remove_file_if_exists(&path).await? {
            debug!(path = %path.display(), "Cache entry removed");
        }
        Ok(())
    }

    // == Clear ==
    /// Deletes every entry in this cache's namespace scope.
    ///
    /// Without a namespace only un-namespaced files are touched, so other
    /// namespaces sharing the directory survive. Returns the number of files
    /// removed. Every deletion is attempted before the first failure is
    /// returned.
    pub async fn clear(&self) -> Result<usize> {
        let paths = self.scoped_paths().await?;
        let outcomes = join_all(paths.iter().map(|path| remove_file_if_exists(path))).await;
        let removed = outcomes
            .into_iter()
            .collect::<Result<Vec<bool>>>()?
            .into_iter()
            .filter(|removed| *removed)
            .count();

        info!(base_path = %self.base_path.display(), count = removed, "Cache cleared");
        Ok(removed)
    }

    // == Save ==
    /// Writes several items concurrently.
    ///
    /// `None` items are dropped. Any remaining item without a key or value
    /// fails the whole call before anything is written. Every write runs to
    /// completion, then the first error in input order is returned; items
    /// that were written stay written.
    pub async fn save<I>(&self, items: I) -> Result<SaveResponse>
    where
        I: IntoIterator,
        I::Item: Into<Option<SaveItem>>,
    {
        let mut valid = Vec::new();
        for (index, item) in items.into_iter().enumerate() {
            let item: Option<SaveItem> = item.into();
            let Some(item) = item else { continue };
            if !item.is_valid() {
                return Err(CacheError::InvalidSaveItem { index });
            }
            valid.push(item);
        }

        if valid.is_empty() {
            return Ok(SaveResponse::default());
        }

        let paths = join_all(
            valid
                .into_iter()
                .map(|item| async move { self.set(&item.key, item.value, None).await }),
        )
        .await
        .into_iter()
        .collect::<Result<Vec<PathBuf>>>()?;

        info!(count = paths.len(), "Cache items saved");
        Ok(SaveResponse { paths })
    }

    // == Load ==
    /// Reads every live entry in this cache's namespace scope.
    ///
    /// Expired entries are left out (and deleted). Order follows the
    /// directory listing.
    pub async fn load(&self) -> Result<LoadResponse> {
        let paths = self.scoped_paths().await?;
        let values = try_join_all(paths.iter().map(|path| read_value(path))).await?;

        let files: Vec<LoadedFile> = paths
            .into_iter()
            .zip(values)
            .filter_map(|(path, value)| value.map(|value| LoadedFile { path, value }))
            .collect();

        debug!(count = files.len(), "Cache files loaded");
        Ok(LoadResponse { files })
    }

    /// Lists the entries in the base directory that belong to this namespace.
    ///
    /// Anything in scope is treated as an entry, so a stray directory makes
    /// `clear` and `load` fail instead of being skipped.
    async fn scoped_paths(&self) -> Result<Vec<PathBuf>> {
        let mut entries = match fs::read_dir(&self.base_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(CacheError::read(self.base_path.clone(), e)),
        };

        let mut paths = Vec::new();
        while let Some(dir_entry) = entries
            .next_entry()
            .await
            .map_err(|e| CacheError::read(self.base_path.clone(), e))?
        {
            let name = dir_entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if in_scope(name, self.namespace.as_deref()) {
                paths.push(dir_entry.path());
            }
        }
        Ok(paths)
    }
}

// == Helpers ==
/// Reads and decodes one entry file, deleting it if it has expired.
async fn read_value(path: &Path) -> Result<Option<CacheValue>> {
    let raw = match fs::read(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(CacheError::read(path, e)),
    };

    match entry::decode(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(DecodeError::Expired) => {
            debug!(path = %path.display(), "Cache entry expired");
            if let Err(e) = fs::remove_file(path).await {
                if e.kind() != ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %e, "Failed to remove expired entry");
                }
            }
            Ok(None)
        }
        Err(e) => Err(CacheError::read(path, e)),
    }
}

/// Deletes a file, reporting whether it was there.
async fn remove_file_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(source) => Err(CacheError::RemoveFailure {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Dot-prefixed sibling the entry is written to before being renamed into
/// place. Directory scans skip dot-prefixed names.
fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("entry");
    let unique = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    path.with_file_name(format!(".{}.{}.{}.tmp", name, process::id(), unique))
}

/// Makes a relative base path absolute against the working directory.
fn resolve_base_path(path: PathBuf) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path);
    }
    let cwd = std::env::current_dir()
        .map_err(|_| CacheError::InvalidBasePath { path: path.clone() })?;
    let relative: PathBuf = path
        .components()
        .filter(|component| !matches!(component, Component::CurDir))
        .collect();
    Ok(cwd.join(relative))
}
