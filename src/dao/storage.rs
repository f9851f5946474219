//! Key-value persistence used by the cart, with JSON encoding and failure isolation.
//!
//! Backends only move strings around. [`JsonStorage`] layers the JSON codec on top and
//! decides which failures are swallowed (reads, removals, missing backend) and which
//! are surfaced to the caller (writes).

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use dashmap::DashMap;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::{debug, warn};

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error surfaced to callers when a value could not be persisted.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The value could not be serialised to JSON.
    #[error("failed to encode value for `{key}`")]
    Encode {
        /// Key the value was meant for.
        key: String,
        /// Serialisation failure.
        #[source]
        source: serde_json::Error,
    },
    /// The backend refused or failed the write.
    #[error("failed to save `{key}` to storage")]
    Write {
        /// Key that could not be written.
        key: String,
        /// Backend failure.
        #[source]
        source: BackendError,
    },
}

impl StorageError {
    /// Construct a write failure from any backend error.
    pub fn write_failed(key: impl Into<String>, source: BackendError) -> Self {
        StorageError::Write {
            key: key.into(),
            source,
        }
    }
}

/// Low-level failure reported by a [`KeyValueStore`] implementation.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Writing the value would exceed the configured storage quota.
    #[error("storage quota exceeded ({requested} bytes requested, {limit} bytes allowed)")]
    QuotaExceeded {
        /// Bytes the store would hold after the write.
        requested: usize,
        /// Configured quota in bytes.
        limit: usize,
    },
    /// The underlying medium failed.
    #[error("storage i/o failure")]
    Io(#[from] io::Error),
}

/// Capability-checked string store backing [`JsonStorage`].
pub trait KeyValueStore: Send + Sync {
    /// Whether the store can be used at all in the current execution context.
    fn is_available(&self) -> bool {
        true
    }
    /// Raw value stored under `key`, `None` when absent.
    fn read(&self, key: &str) -> Result<Option<String>, BackendError>;
    /// Store `value` under `key`, replacing any previous value.
    fn write(&self, key: &str, value: &str) -> Result<(), BackendError>;
    /// Remove `key`; removing an absent key succeeds.
    fn delete(&self, key: &str) -> Result<(), BackendError>;
}

/// Store used when no persistent medium exists (headless runs, server-side rendering).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStore;

impl KeyValueStore for NoopStore {
    fn is_available(&self) -> bool {
        false
    }

    fn read(&self, _key: &str) -> Result<Option<String>, BackendError> {
        Ok(None)
    }

    fn write(&self, _key: &str, _value: &str) -> Result<(), BackendError> {
        Ok(())
    }

    fn delete(&self, _key: &str) -> Result<(), BackendError> {
        Ok(())
    }
}

/// In-process store with an optional byte quota, mirroring browser-local storage limits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStore {
    /// Unbounded in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// In-memory store refusing writes once keys and values exceed `limit` bytes.
    pub fn with_quota(limit: usize) -> Self {
        Self {
            entries: DashMap::new(),
            quota: Some(limit),
        }
    }

    /// Raw stored string for `key`, bypassing the JSON layer.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Store a raw string, bypassing quota and JSON encoding.
    pub fn insert_raw(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Whether a value exists for `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn usage_without(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.key() != key)
            .map(|entry| entry.key().len() + entry.value().len())
            .sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, BackendError> {
        Ok(self.raw(key))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), BackendError> {
        if let Some(limit) = self.quota {
            let requested = self.usage_without(key) + key.len() + value.len();
            if requested > limit {
                return Err(BackendError::QuotaExceeded { requested, limit });
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), BackendError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Directory-backed store keeping one `<key>.json` file per entry.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Store rooted at `root`; the directory is created lazily on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the entries.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File used for `key`. Characters outside `[A-Za-z0-9_.-]` are replaced by `_`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(format!("{file_name}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn is_available(&self) -> bool {
        !self.root.is_file()
    }

    fn read(&self, key: &str) -> Result<Option<String>, BackendError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), BackendError> {
        fs::create_dir_all(&self.root)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), BackendError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// JSON codec over a [`KeyValueStore`].
#[derive(Clone)]
pub struct JsonStorage {
    backend: Arc<dyn KeyValueStore>,
}

impl JsonStorage {
    /// Wrap an existing backend.
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Storage that never persists anything.
    pub fn disabled() -> Self {
        Self::new(Arc::new(NoopStore))
    }

    /// Whether the backend is usable in the current context.
    pub fn is_available(&self) -> bool {
        self.backend.is_available()
    }

    /// Read and decode the value stored under `key`.
    ///
    /// Missing backends, missing keys, read failures and malformed content all yield
    /// `None`; the latter two are logged.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if !self.backend.is_available() {
            return None;
        }

        let raw = match self.backend.read(key) {
            Ok(Some(raw)) if !raw.is_empty() => raw,
            Ok(_) => return None,
            Err(err) => {
                warn!(key, error = %err, "failed to read from storage");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(key, error = %err, "ignoring malformed stored value");
                None
            }
        }
    }

    /// Encode `value` and replace whatever is stored under `key`.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StorageResult<()> {
        if !self.backend.is_available() {
            debug!(key, "storage unavailable; skipping write");
            return Ok(());
        }

        let encoded = serde_json::to_string(value).map_err(|source| StorageError::Encode {
            key: key.to_string(),
            source,
        })?;

        self.backend.write(key, &encoded).map_err(|err| {
            warn!(key, error = %err, "failed to write to storage");
            StorageError::write_failed(key, err)
        })
    }

    /// Erase `key`. Failures are logged and otherwise ignored.
    pub fn remove(&self, key: &str) {
        if !self.backend.is_available() {
            return;
        }

        if let Err(err) = self.backend.delete(key) {
            warn!(key, error = %err, "failed to remove from storage");
        }
    }
}
