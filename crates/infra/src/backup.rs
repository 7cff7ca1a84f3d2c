//! Whole-workspace backup: export to one JSON document, import by full
//! overwrite.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use invoicemint_companies::Company;
use invoicemint_invoicing::Invoice;

use crate::snapshot::{self, COMPANIES_KEY, INVOICES_KEY};
use crate::storage::{KeyValueStorage, StorageError};

pub const BACKUP_VERSION: &str = "1.0";

#[derive(Debug, Error)]
pub enum ImportError {
    /// The document is not a valid backup; nothing was written.
    #[error("invalid backup file format: {0}")]
    Format(String),

    /// Writing the imported snapshots failed; previous data was restored
    /// where possible.
    #[error("failed to persist imported backup: {0}")]
    Persistence(#[from] StorageError),
}

/// Exported state of every company and invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    pub companies: Vec<Company>,
    pub invoices: Vec<Invoice>,
    pub export_date: DateTime<Utc>,
    pub version: String,
}

impl BackupDocument {
    pub fn new(companies: &[Company], invoices: &[Invoice], export_date: DateTime<Utc>) -> Self {
        Self {
            companies: companies.to_vec(),
            invoices: invoices.to_vec(),
            export_date,
            version: BACKUP_VERSION.to_string(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// `invoice-backup-YYYY-MM-DD.json` for the export date.
    pub fn file_name(&self) -> String {
        format!("invoice-backup-{}.json", self.export_date.format("%Y-%m-%d"))
    }
}

/// Counts of what an import wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub companies: usize,
    pub invoices: usize,
}

fn required_array(
    doc: &serde_json::Map<String, Value>,
    key: &str,
) -> Result<Vec<Value>, ImportError> {
    match doc.get(key) {
        None | Some(Value::Null) => Err(ImportError::Format(format!("missing `{key}`"))),
        Some(Value::Array(items)) => Ok(items.clone()),
        Some(_) => Err(ImportError::Format(format!("`{key}` must be an array"))),
    }
}

fn decode_all<T: serde::de::DeserializeOwned>(
    key: &str,
    items: Vec<Value>,
) -> Result<Vec<T>, ImportError> {
    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| {
            serde_json::from_value(item)
                .map_err(|e| ImportError::Format(format!("{key} record {idx}: {e}")))
        })
        .collect()
}

/// Parse and fully validate a backup document without touching storage.
///
/// Both `companies` and `invoices` must be present; any record that does not
/// decode rejects the whole document. `exportDate` and `version` are not
/// required.
pub fn parse(bytes: &[u8]) -> Result<(Vec<Company>, Vec<Invoice>), ImportError> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| ImportError::Format(format!("not JSON: {e}")))?;
    let Value::Object(doc) = value else {
        return Err(ImportError::Format("expected a JSON object".to_string()));
    };

    let companies = required_array(&doc, "companies")?;
    let invoices = required_array(&doc, "invoices")?;

    let companies: Vec<Company> = decode_all("companies", companies)?;
    let invoices: Vec<Invoice> = decode_all("invoices", invoices)?;
    Ok((
        companies.into_iter().map(Company::normalized).collect(),
        invoices.into_iter().map(Invoice::normalized).collect(),
    ))
}

/// Replace the persisted companies and invoices with a backup's contents.
///
/// No merge: what was stored before is overwritten. If the invoices write
/// fails after companies were written, the previous companies snapshot is put
/// back before the error is returned.
pub fn import<S>(storage: &S, bytes: &[u8]) -> Result<ImportSummary, ImportError>
where
    S: KeyValueStorage + ?Sized,
{
    let (companies, invoices) = parse(bytes)?;

    let previous_companies = storage.load(COMPANIES_KEY)?;
    snapshot::write(storage, COMPANIES_KEY, &companies)?;
    if let Err(err) = snapshot::write(storage, INVOICES_KEY, &invoices) {
        let restore = previous_companies.unwrap_or_else(|| b"[]".to_vec());
        if let Err(restore_err) = storage.save(COMPANIES_KEY, &restore) {
            tracing::error!(
                error = %restore_err,
                "failed to restore companies after import failure"
            );
        }
        return Err(err.into());
    }

    let summary = ImportSummary {
        companies: companies.len(),
        invoices: invoices.len(),
    };
    tracing::info!(companies = summary.companies, invoices = summary.invoices, "backup imported");
    Ok(summary)
}
