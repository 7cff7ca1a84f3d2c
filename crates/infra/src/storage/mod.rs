//! Key/value storage boundary.
//!
//! The stores only need `load(key) -> bytes` and `save(key, bytes)`; whatever
//! transport sits behind that (browser-style local storage, files, a test map)
//! is a backend of [`KeyValueStorage`].

pub mod file;
pub mod in_memory;
pub mod r#trait;

pub use file::FileStorage;
pub use in_memory::InMemoryStorage;
pub use r#trait::{KeyValueStorage, SharedStorage, StorageError};
