//! Key-value persistence: the local-storage analogue shared by the session
//! manager and the settings store.
//!
//! Values are plain strings (callers store JSON). Every implementation has a
//! byte quota; a write that would exceed it fails with
//! [`StorageError::QuotaExceeded`] and leaves the previous value in place.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::error::StorageError;

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

pub type SharedStore = Arc<dyn KeyValueStore>;

// ── Quota-aware map ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
struct Entries {
    map: BTreeMap<String, String>,
    limit: Option<usize>,
}

fn entry_size(key: &str, value: &str) -> usize {
    key.len() + value.len()
}

impl Entries {
    fn used(&self) -> usize {
        self.map.iter().map(|(k, v)| entry_size(k, v)).sum()
    }

    fn check_insert(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let Some(limit) = self.limit else {
            return Ok(());
        };
        let replaced = self.map.get(key).map_or(0, |old| entry_size(key, old));
        let needed = self.used() - replaced + entry_size(key, value);
        if needed > limit {
            return Err(StorageError::QuotaExceeded { needed, limit });
        }
        Ok(())
    }
}

// ── In-memory store ───────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<Entries>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(limit: usize) -> Self {
        Self {
            entries: RwLock::new(Entries {
                map: BTreeMap::new(),
                limit: Some(limit),
            }),
        }
    }

    pub fn shared(self) -> SharedStore {
        Arc::new(self)
    }

    /// Bytes currently in use (key plus value lengths).
    pub fn used_bytes(&self) -> usize {
        self.entries.read().map(|e| e.used()).unwrap_or(0)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self.entries.read().map_err(|_| StorageError::Poisoned)?;
        Ok(guard.map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self.entries.write().map_err(|_| StorageError::Poisoned)?;
        guard.check_insert(key, value)?;
        guard.map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self.entries.write().map_err(|_| StorageError::Poisoned)?;
        guard.map.remove(key);
        Ok(())
    }
}

// ── File-backed store ─────────────────────────────────────────────────────────

/// One JSON object on disk holding every key. Loaded once on open and
/// rewritten on each mutation. A malformed file opens as empty.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<Entries>,
}

impl FileStore {
    pub fn open(path: &Path, limit: usize) -> Self {
        let map: BTreeMap<String, String> = crate::config::load_json(path);
        Self {
            path: path.to_path_buf(),
            entries: RwLock::new(Entries {
                map,
                limit: Some(limit),
            }),
        }
    }

    pub fn shared(self) -> SharedStore {
        Arc::new(self)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(map)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self.entries.read().map_err(|_| StorageError::Poisoned)?;
        Ok(guard.map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self.entries.write().map_err(|_| StorageError::Poisoned)?;
        guard.check_insert(key, value)?;
        let previous = guard.map.insert(key.to_string(), value.to_string());
        if let Err(err) = self.flush(&guard.map) {
            match previous {
                Some(old) => guard.map.insert(key.to_string(), old),
                None => guard.map.remove(key),
            };
            return Err(err);
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self.entries.write().map_err(|_| StorageError::Poisoned)?;
        if guard.map.remove(key).is_some() {
            self.flush(&guard.map)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_rejects_writes_over_quota_and_keeps_old_value() {
        let store = MemoryStore::with_quota(16);
        store.set("k", "short").unwrap();
        let err = store.set("k", "this value is far too long").unwrap_err();
        assert!(err.is_quota());
        assert_eq!(store.get("k").unwrap().as_deref(), Some("short"));
    }

    #[test]
    fn replacing_a_value_only_counts_the_new_size() {
        let store = MemoryStore::with_quota(10);
        store.set("key", "1234567").unwrap();
        store.set("key", "7654321").unwrap();
        assert_eq!(store.used_bytes(), 10);
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        {
            let store = FileStore::open(&path, 1024);
            store.set("familia_user", "{}").unwrap();
            store.set("other", "x").unwrap();
            store.remove("other").unwrap();
        }
        let reopened = FileStore::open(&path, 1024);
        assert_eq!(reopened.get("familia_user").unwrap().as_deref(), Some("{}"));
        assert_eq!(reopened.get("other").unwrap(), None);
    }

    #[test]
    fn malformed_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "[[[").unwrap();
        let store = FileStore::open(&path, 1024);
        assert_eq!(store.get("anything").unwrap(), None);
    }

    #[test]
    fn failed_flush_rolls_back_the_insert() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-subdir").join("storage.json");
        let store = FileStore::open(&path, 1024);
        assert!(matches!(store.set("k", "v"), Err(StorageError::Io(_))));
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn removing_an_absent_key_is_fine() {
        let store = MemoryStore::new();
        store.remove("nope").unwrap();
        assert_eq!(store.get("nope").unwrap(), None);
    }
}
