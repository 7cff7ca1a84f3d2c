use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use super::r#trait::{KeyValueStorage, StorageError};

/// In-memory key/value storage.
///
/// Intended for tests/dev. Writes to keys registered with
/// [`InMemoryStorage::reject_writes`] fail, which lets tests exercise the
/// persistence-failure paths.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    entries: RwLock<HashMap<String, Vec<u8>>>,
    rejected: RwLock<HashSet<String>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `save` to `key` fail.
    pub fn reject_writes(&self, key: &str) {
        if let Ok(mut rejected) = self.rejected.write() {
            rejected.insert(key.to_string());
        }
    }

    pub fn accept_writes(&self, key: &str) {
        if let Ok(mut rejected) = self.rejected.write() {
            rejected.remove(key);
        }
    }

    /// Raw bytes under `key`, bypassing the trait (test inspection).
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.read().ok()?.get(key).cloned()
    }

    /// Store raw bytes under `key`, ignoring rejections (test seeding).
    pub fn put_raw(&self, key: &str, bytes: impl Into<Vec<u8>>) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key.to_string(), bytes.into());
        }
    }
}

impl KeyValueStorage for InMemoryStorage {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StorageError::Unavailable("lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn save(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let rejected = self
            .rejected
            .read()
            .map_err(|_| StorageError::Unavailable("lock poisoned".to_string()))?
            .contains(key);
        if rejected {
            return Err(StorageError::Unavailable(format!("writes to {key} are rejected")));
        }

        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::Unavailable("lock poisoned".to_string()))?;
        entries.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}
