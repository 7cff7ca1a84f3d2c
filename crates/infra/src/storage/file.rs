use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::r#trait::{KeyValueStorage, StorageError};

/// One `<key>.json` file per key under a data directory.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// crashed write never leaves a truncated snapshot behind.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open (creating if needed) the data directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| StorageError::Io {
            key: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStorage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.path_for(key)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn save(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        let io = |source| StorageError::Io {
            key: key.to_string(),
            source,
        };
        std::fs::write(&tmp, bytes).map_err(io)?;
        std::fs::rename(&tmp, &path).map_err(io)?;
        tracing::debug!(key, bytes = bytes.len(), path = %path.display(), "snapshot written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("invoicemint-test-{}", uuid::Uuid::now_v7()))
    }

    #[test]
    fn saves_and_loads_through_files() {
        let dir = scratch_dir();
        let storage = FileStorage::open(&dir).unwrap();
        assert!(storage.load("invoices").unwrap().is_none());

        storage.save("invoices", b"[]").unwrap();
        assert_eq!(storage.load("invoices").unwrap().as_deref(), Some(&b"[]"[..]));
        assert!(dir.join("invoices.json").exists());
        assert!(!dir.join(".invoices.json.tmp").exists());

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn rejects_path_like_keys() {
        let dir = scratch_dir();
        let storage = FileStorage::open(&dir).unwrap();
        assert!(matches!(storage.save("../escape", b""), Err(StorageError::InvalidKey(_))));
        assert!(matches!(storage.load(""), Err(StorageError::InvalidKey(_))));
        let _ = std::fs::remove_dir_all(dir);
    }
}
