//! Composition root: both stores over one storage backend.

use std::sync::Arc;

use invoicemint_companies::{Company, CompanyDraft, CompanyPatch};
use invoicemint_core::{Clock, CompanyId, DomainError, DomainResult, InvoiceId, SystemClock};
use invoicemint_invoicing::{CompanySummary, Invoice, InvoiceDraft, InvoicePatch};

use crate::backup::{self, BackupDocument, ImportError, ImportSummary};
use crate::config::{AppConfig, DeletePolicy};
use crate::print::PrintContext;
use crate::snapshot::PersistenceWarning;
use crate::storage::{FileStorage, InMemoryStorage, KeyValueStorage, SharedStorage, StorageError};
use crate::stores::{CompanyStore, InvoiceStore};

/// One user's invoicing workspace.
///
/// Both stores are loaded once on construction. Operations that span the two
/// stores (invoice creation, company deletion, backup) live here.
pub struct Session<S> {
    storage: S,
    clock: Arc<dyn Clock>,
    companies: CompanyStore<S>,
    invoices: InvoiceStore<S>,
    delete_policy: DeletePolicy,
}

impl Session<SharedStorage> {
    /// Open the backend named by `config`.
    pub fn open(config: &AppConfig) -> Result<Self, StorageError> {
        let storage: SharedStorage = match &config.data_dir {
            Some(dir) => Arc::new(FileStorage::open(dir)?),
            None => Arc::new(InMemoryStorage::new()),
        };
        tracing::info!(
            data_dir = ?config.data_dir,
            delete_policy = ?config.delete_policy,
            "opening invoicing session"
        );
        Ok(Self::with_storage(storage, config.delete_policy))
    }
}

impl<S: KeyValueStorage + Clone> Session<S> {
    pub fn with_storage(storage: S, delete_policy: DeletePolicy) -> Self {
        Self::with_clock(storage, delete_policy, Arc::new(SystemClock))
    }

    pub fn with_clock(storage: S, delete_policy: DeletePolicy, clock: Arc<dyn Clock>) -> Self {
        let companies = CompanyStore::open_with_clock(storage.clone(), clock.clone());
        let invoices = InvoiceStore::open_with_clock(storage.clone(), clock.clone());
        Self {
            storage,
            clock,
            companies,
            invoices,
            delete_policy,
        }
    }

    pub fn companies(&self) -> &CompanyStore<S> {
        &self.companies
    }

    pub fn invoices(&self) -> &InvoiceStore<S> {
        &self.invoices
    }

    pub fn delete_policy(&self) -> DeletePolicy {
        self.delete_policy
    }

    pub fn current_company(&self) -> Option<&Company> {
        self.companies.current()
    }

    pub fn create_company(&mut self, draft: CompanyDraft) -> DomainResult<Company> {
        self.companies.create(draft)
    }

    pub fn update_company(&mut self, id: &CompanyId, patch: CompanyPatch) -> DomainResult<Company> {
        self.companies.update(id, patch)
    }

    /// Delete a company, applying the session's [`DeletePolicy`] to its
    /// invoices. Returns how many invoices were deleted along with it.
    pub fn delete_company(&mut self, id: &CompanyId) -> DomainResult<usize> {
        if self.companies.get(id).is_none() {
            return Err(DomainError::not_found(format!("company {id}")));
        }
        let owned = self.invoices.list_by_company(id).len();

        match self.delete_policy {
            DeletePolicy::Restrict if owned > 0 => Err(DomainError::validation(format!(
                "company {id} still has {owned} invoice(s)"
            ))),
            DeletePolicy::Cascade => {
                self.companies.delete(id)?;
                Ok(self.invoices.delete_by_company(id))
            }
            DeletePolicy::Orphan | DeletePolicy::Restrict => {
                self.companies.delete(id)?;
                if owned > 0 {
                    tracing::info!(
                        company_id = %id,
                        orphaned = owned,
                        "company deleted; invoices kept"
                    );
                }
                Ok(0)
            }
        }
    }

    pub fn set_current_company(&mut self, id: &CompanyId) -> DomainResult<()> {
        self.companies.set_current(id)
    }

    /// Create an invoice for the current company (see [`InvoiceStore::create`]).
    pub fn create_invoice(&mut self, draft: InvoiceDraft) -> DomainResult<Invoice> {
        self.invoices.create(&mut self.companies, draft)
    }

    pub fn update_invoice(&mut self, id: &InvoiceId, patch: InvoicePatch) -> DomainResult<Invoice> {
        self.invoices.update(id, patch)
    }

    pub fn delete_invoice(&mut self, id: &InvoiceId) -> DomainResult<()> {
        self.invoices.delete(id)
    }

    /// Invoices of the current company, insertion order.
    pub fn current_invoices(&self) -> DomainResult<Vec<&Invoice>> {
        let company = self.companies.current().ok_or(DomainError::NoCompanySelected)?;
        Ok(self.invoices.list_by_company(company.id_typed()))
    }

    pub fn current_summary(&self) -> DomainResult<CompanySummary> {
        let company = self.companies.current().ok_or(DomainError::NoCompanySelected)?;
        Ok(self.invoices.summary(company.id_typed()))
    }

    /// Invoices whose company no longer exists.
    pub fn orphaned_invoices(&self) -> Vec<&Invoice> {
        self.invoices.orphans(self.companies.list())
    }

    /// Invoice plus owning company, ready for a renderer.
    pub fn print_context(&self, id: &InvoiceId) -> DomainResult<PrintContext> {
        let invoice = self
            .invoices
            .get(id)
            .ok_or_else(|| DomainError::not_found(format!("invoice {id}")))?;
        let company = self.companies.get(invoice.company_id()).ok_or_else(|| {
            DomainError::not_found(format!("company {} of invoice {id}", invoice.company_id()))
        })?;
        Ok(PrintContext {
            invoice: invoice.clone(),
            company: company.clone(),
        })
    }

    pub fn export_backup(&self) -> BackupDocument {
        BackupDocument::new(self.companies.list(), self.invoices.list(), self.clock.now())
    }

    /// Overwrite all persisted data with a backup, then reload both stores.
    ///
    /// On rejection the stores are left as they were.
    pub fn import_backup(&mut self, bytes: &[u8]) -> Result<ImportSummary, ImportError> {
        let summary = backup::import(&self.storage, bytes)?;
        self.companies.load();
        self.invoices.load();
        // Re-persist the pointer resolved against the imported list.
        self.companies.save();
        Ok(summary)
    }

    /// Persistence failures from both stores since the last call.
    pub fn drain_persistence_warnings(&mut self) -> Vec<PersistenceWarning> {
        let mut warnings = self.companies.drain_persistence_warnings();
        warnings.extend(self.invoices.drain_persistence_warnings());
        warnings
    }
}
