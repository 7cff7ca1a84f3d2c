//! Configuration loading and representation.
//!
//! Read from the environment:
//! - `INVOICEMINT_DATA_DIR`: directory for file-backed snapshots; unset means
//!   an in-memory backend (nothing survives the process).
//! - `INVOICEMINT_COMPANY_DELETE_POLICY`: `orphan` (default), `cascade` or
//!   `restrict`.

use std::path::PathBuf;

pub const DATA_DIR_VAR: &str = "INVOICEMINT_DATA_DIR";
pub const DELETE_POLICY_VAR: &str = "INVOICEMINT_COMPANY_DELETE_POLICY";

/// What deleting a company does to its invoices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Invoices stay, owned by a company that no longer exists.
    #[default]
    Orphan,
    /// Invoices are deleted with the company.
    Cascade,
    /// Deletion is refused while the company has invoices.
    Restrict,
}

impl core::str::FromStr for DeletePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "orphan" => Ok(Self::Orphan),
            "cascade" => Ok(Self::Cascade),
            "restrict" => Ok(Self::Restrict),
            other => Err(format!("unknown company delete policy: {other}")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: Option<PathBuf>,
    pub delete_policy: DeletePolicy,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let data_dir = lookup(DATA_DIR_VAR)
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);
        if data_dir.is_none() {
            tracing::warn!("{DATA_DIR_VAR} not set; using in-memory storage");
        }

        let delete_policy = match lookup(DELETE_POLICY_VAR) {
            None => DeletePolicy::default(),
            Some(raw) => raw.parse().unwrap_or_else(|err| {
                tracing::warn!("{err}; falling back to orphan");
                DeletePolicy::default()
            }),
        };

        Self {
            data_dir,
            delete_policy,
        }
    }
}
