use std::sync::Arc;

use thiserror::Error;

/// Storage backend failure.
///
/// These are **infrastructure errors**. The stores treat them as non-fatal:
/// in-memory state stays authoritative and the failure is queued as a
/// [`PersistenceWarning`](crate::snapshot::PersistenceWarning).
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    #[error("io error on {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode {key}: {reason}")]
    Encode { key: String, reason: String },

    #[error("failed to decode {key}: {reason}")]
    Decode { key: String, reason: String },
}

/// Byte-oriented key/value store holding whole snapshots.
///
/// Calls are synchronous and expected to be local; a backend signals failure
/// through `StorageError` rather than panicking.
pub trait KeyValueStorage: Send + Sync {
    /// Bytes stored under `key`, or `None` if nothing was ever saved.
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Replace whatever is stored under `key`.
    fn save(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError>;
}

/// Type-erased handle shared by both stores.
pub type SharedStorage = Arc<dyn KeyValueStorage>;

impl<S> KeyValueStorage for Arc<S>
where
    S: KeyValueStorage + ?Sized,
{
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        (**self).load(key)
    }

    fn save(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        (**self).save(key, bytes)
    }
}
