//! Tab-scoped storage for generated identity values.
//!
//! A "tab" is whatever scope a store instance is bound to: the process for
//! `MemoryStore`, a single JSON file for `FileStore`.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

/// Key/value storage scoped to one tab.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str);

    /// Return the stored value for `key`, storing `init()` first if absent.
    ///
    /// Implementations should make the check-and-store atomic.
    fn get_or_insert_with(&self, key: &str, init: &mut dyn FnMut() -> String) -> String {
        if let Some(existing) = self.get(key) {
            return existing;
        }
        let value = init();
        self.set(key, &value);
        value
    }
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        // A poisoned map is still a valid map.
        self.values.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.lock().insert(key.to_string(), value.to_string());
    }

    fn get_or_insert_with(&self, key: &str, init: &mut dyn FnMut() -> String) -> String {
        self.lock().entry(key.to_string()).or_insert_with(init).clone()
    }
}

/// Store persisted as a flat JSON object in a single file.
///
/// Writes go through to disk immediately. A failed write is logged and the
/// value is kept in memory, so lookups stay stable for this process.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt {
                path: path.clone(),
                message: e.to_string(),
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(StoreError::Io {
                    path,
                    message: e.to_string(),
                });
            }
        };
        debug!("Opened session store at {} ({} values)", path.display(), values.len());

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.values.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn persist(&self, values: &BTreeMap<String, String>) {
        let result = serde_json::to_string_pretty(values)
            .map_err(|e| e.to_string())
            .and_then(|raw| fs::write(&self.path, raw).map_err(|e| e.to_string()));

        if let Err(e) = result {
            warn!("Failed to persist session store {}: {}", self.path.display(), e);
        }
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut values = self.lock();
        values.insert(key.to_string(), value.to_string());
        self.persist(&values);
    }

    fn get_or_insert_with(&self, key: &str, init: &mut dyn FnMut() -> String) -> String {
        let mut values = self.lock();
        if let Some(existing) = values.get(key) {
            return existing.clone();
        }
        let value = init();
        values.insert(key.to_string(), value.clone());
        self.persist(&values);
        value
    }
}

/// Errors opening a file-backed store.
#[derive(Debug, Clone)]
pub enum StoreError {
    /// The file exists but could not be read.
    Io { path: PathBuf, message: String },
    /// The file is not a JSON object of strings.
    Corrupt { path: PathBuf, message: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, message } => {
                write!(f, "Failed to read session store {}: {}", path.display(), message)
            }
            Self::Corrupt { path, message } => {
                write!(f, "Session store {} is corrupt: {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for StoreError {}
