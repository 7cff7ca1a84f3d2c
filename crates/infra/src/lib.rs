//! Infrastructure layer: storage backends, snapshot-backed stores, backup,
//! configuration and the session that wires them together.

pub mod backup;
pub mod config;
pub mod print;
pub mod session;
pub mod snapshot;
pub mod storage;
pub mod stores;

pub use backup::{BackupDocument, ImportError, ImportSummary};
pub use config::{AppConfig, DeletePolicy};
pub use print::{InvoiceRenderer, PrintContext};
pub use session::Session;
pub use snapshot::PersistenceWarning;
pub use storage::{FileStorage, InMemoryStorage, KeyValueStorage, SharedStorage, StorageError};
pub use stores::{CompanyDirectory, CompanyStore, InvoiceStore};
