//! Snapshot encoding on top of [`KeyValueStorage`].
//!
//! Each store writes its full state under a fixed key after every mutation
//! and reads it back once at startup. Records are decoded one at a time so a
//! single malformed entry is dropped (and reported) instead of discarding the
//! whole snapshot.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::storage::{KeyValueStorage, StorageError};

pub const COMPANIES_KEY: &str = "companies";
pub const CURRENT_COMPANY_KEY: &str = "currentCompany";
pub const INVOICES_KEY: &str = "invoices";

/// A write (or read) that failed while the in-memory state moved on.
///
/// Surfaced to callers through the stores' `drain_persistence_warnings`.
#[derive(Debug)]
pub struct PersistenceWarning {
    pub key: String,
    pub error: StorageError,
}

impl core::fmt::Display for PersistenceWarning {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.key, self.error)
    }
}

pub fn encode<T: Serialize + ?Sized>(key: &str, value: &T) -> Result<Vec<u8>, StorageError> {
    serde_json::to_vec(value).map_err(|e| StorageError::Encode {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

pub fn write<S, T>(storage: &S, key: &str, value: &T) -> Result<(), StorageError>
where
    S: KeyValueStorage + ?Sized,
    T: Serialize + ?Sized,
{
    let bytes = encode(key, value)?;
    storage.save(key, &bytes)?;
    tracing::debug!(key, bytes = bytes.len(), "snapshot saved");
    Ok(())
}

fn parse(key: &str, bytes: &[u8]) -> Result<Value, StorageError> {
    serde_json::from_slice(bytes).map_err(|e| StorageError::Decode {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

/// Records decoded from a list snapshot, plus one error per rejected record.
#[derive(Debug)]
pub struct Decoded<T> {
    pub records: Vec<T>,
    pub rejected: Vec<StorageError>,
}

impl<T> Default for Decoded<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            rejected: Vec::new(),
        }
    }
}

/// Decode a JSON array record by record.
pub fn decode_records<T: DeserializeOwned>(
    key: &str,
    bytes: &[u8],
) -> Result<Decoded<T>, StorageError> {
    let Value::Array(items) = parse(key, bytes)? else {
        return Err(StorageError::Decode {
            key: key.to_string(),
            reason: "expected a JSON array".to_string(),
        });
    };

    let mut decoded = Decoded::default();
    for (idx, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<T>(item) {
            Ok(record) => decoded.records.push(record),
            Err(e) => decoded.rejected.push(StorageError::Decode {
                key: key.to_string(),
                reason: format!("record {idx}: {e}"),
            }),
        }
    }
    Ok(decoded)
}

/// Load a list snapshot. A missing key is an empty list.
pub fn read_records<S, T>(storage: &S, key: &str) -> Result<Decoded<T>, StorageError>
where
    S: KeyValueStorage + ?Sized,
    T: DeserializeOwned,
{
    match storage.load(key)? {
        Some(bytes) => decode_records(key, &bytes),
        None => Ok(Decoded::default()),
    }
}

/// Load a single-record snapshot. Missing key and JSON `null` are both `None`.
pub fn read_optional<S, T>(storage: &S, key: &str) -> Result<Option<T>, StorageError>
where
    S: KeyValueStorage + ?Sized,
    T: DeserializeOwned,
{
    let Some(bytes) = storage.load(key)? else {
        return Ok(None);
    };
    match parse(key, &bytes)? {
        Value::Null => Ok(None),
        value => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| StorageError::Decode {
                key: key.to_string(),
                reason: e.to_string(),
            }),
    }
}
