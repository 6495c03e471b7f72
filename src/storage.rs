//! Local key/value store
//!
//! A string-to-string map with the semantics of browser local storage:
//! synchronous, whole-value writes, and writes that may fail. `FileStore`
//! keeps the map in a JSON file; `MemoryStore` keeps it in memory and can
//! simulate a quota for tests.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Key under which the last summary record is stored
pub const LAST_SUMMARY_KEY: &str = "lastSummary";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage quota exceeded")]
    QuotaExceeded,
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage file is corrupt: {0}")]
    Corrupt(String),
}

pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value under `key`
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Store backed by a JSON object on disk
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `store.json` inside the given data directory
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join("store.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, StorageError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)
            .map_err(|e| StorageError::Unavailable(format!("{}: {}", self.path.display(), e)))?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content).map_err(|e| StorageError::Corrupt(e.to_string()))
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let content = serde_json::to_string_pretty(map)
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| StorageError::Unavailable(format!("{}: {}", parent.display(), e)))?;
        }

        // Temp file + rename: the store file is never half-written
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content)
            .map_err(|e| StorageError::Unavailable(format!("{}: {}", tmp_path.display(), e)))?;
        fs::rename(&tmp_path, &self.path)
            .map_err(|e| StorageError::Unavailable(format!("{}: {}", self.path.display(), e)))?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_map()?.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        // Corrupt file gets replaced
        let mut map = match self.read_map() {
            Ok(map) => map,
            Err(StorageError::Corrupt(e)) => {
                eprintln!("[Store] Discarding corrupt store {}: {}", self.path.display(), e);
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }
}

/// In-memory store with an optional byte quota over all keys and values
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: BTreeMap<String, String>,
    quota_bytes: Option<usize>,
    disabled: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            quota_bytes: Some(quota_bytes),
            ..Self::default()
        }
    }

    /// A store that rejects every access, like storage blocked by the user
    pub fn disabled() -> Self {
        Self {
            disabled: true,
            ..Self::default()
        }
    }

    fn used_bytes_without(&self, key: &str) -> usize {
        self.items
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.disabled {
            return Err(StorageError::Unavailable("storage disabled".to_string()));
        }
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.disabled {
            return Err(StorageError::Unavailable("storage disabled".to_string()));
        }
        if let Some(quota) = self.quota_bytes {
            if self.used_bytes_without(key) + key.len() + value.len() > quota {
                return Err(StorageError::QuotaExceeded);
            }
        }
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
