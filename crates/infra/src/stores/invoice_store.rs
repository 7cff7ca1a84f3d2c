use std::sync::Arc;

use invoicemint_companies::Company;
use invoicemint_core::{
    Clock, CompanyId, DomainError, DomainResult, InvoiceId, SystemClock, entity::position_of,
};
use invoicemint_invoicing::{
    CompanySummary, Invoice, InvoiceDraft, InvoiceItem, InvoicePatch, matches_search,
};

use crate::snapshot::{self, INVOICES_KEY, PersistenceWarning};
use crate::storage::{KeyValueStorage, StorageError};

use super::CompanyDirectory;

/// Invoices of every company, in insertion order.
pub struct InvoiceStore<S> {
    storage: S,
    clock: Arc<dyn Clock>,
    invoices: Vec<Invoice>,
    warnings: Vec<PersistenceWarning>,
}

impl<S: KeyValueStorage> InvoiceStore<S> {
    /// Open the store and load its snapshot.
    pub fn open(storage: S) -> Self {
        Self::open_with_clock(storage, Arc::new(SystemClock))
    }

    pub fn open_with_clock(storage: S, clock: Arc<dyn Clock>) -> Self {
        let mut store = Self {
            storage,
            clock,
            invoices: Vec::new(),
            warnings: Vec::new(),
        };
        store.load();
        store
    }

    /// Replace in-memory state with the persisted snapshot.
    ///
    /// Every record is coerced on decode and its totals recomputed; records
    /// that cannot be decoded are reported as warnings and skipped.
    pub fn load(&mut self) {
        let decoded = match snapshot::read_records::<_, Invoice>(&self.storage, INVOICES_KEY) {
            Ok(decoded) => decoded,
            Err(error) => {
                self.warn(error);
                Default::default()
            }
        };
        for error in decoded.rejected {
            self.warn(error);
        }
        self.invoices = decoded
            .records
            .into_iter()
            .map(Invoice::normalized)
            .collect();
        tracing::debug!(invoices = self.invoices.len(), "invoice snapshot loaded");
    }

    pub fn save(&mut self) {
        if let Err(error) = snapshot::write(&self.storage, INVOICES_KEY, &self.invoices) {
            self.warn(error);
        }
    }

    pub fn list(&self) -> &[Invoice] {
        &self.invoices
    }

    pub fn get(&self, id: &InvoiceId) -> Option<&Invoice> {
        self.invoices.iter().find(|i| i.id_typed() == id)
    }

    /// Invoices owned by `company_id`, in insertion order.
    ///
    /// Works for deleted companies too: orphaned invoices stay listable.
    pub fn list_by_company(&self, company_id: &CompanyId) -> Vec<&Invoice> {
        self.invoices
            .iter()
            .filter(|i| i.company_id() == company_id)
            .collect()
    }

    /// Invoices whose company is not in `companies`.
    pub fn orphans(&self, companies: &[Company]) -> Vec<&Invoice> {
        self.invoices
            .iter()
            .filter(|i| !companies.iter().any(|c| c.id_typed() == i.company_id()))
            .collect()
    }

    /// A company's invoices matching `term` (see [`matches_search`]).
    pub fn search(&self, company_id: &CompanyId, term: &str) -> Vec<&Invoice> {
        self.list_by_company(company_id)
            .into_iter()
            .filter(|i| matches_search(i, term))
            .collect()
    }

    pub fn summary(&self, company_id: &CompanyId) -> CompanySummary {
        CompanySummary::from_invoices(self.list_by_company(company_id))
    }

    /// Create an invoice for the current company.
    ///
    /// Validation runs first; only then is the company's counter advanced
    /// (exactly once), so a rejected draft never consumes a number. The
    /// counter stays advanced even if the invoice snapshot write then fails.
    pub fn create<D>(&mut self, companies: &mut D, draft: InvoiceDraft) -> DomainResult<Invoice>
    where
        D: CompanyDirectory + ?Sized,
    {
        let company = companies
            .current_company()
            .ok_or(DomainError::NoCompanySelected)?;
        let invoice = Invoice::issue(InvoiceId::new(), company, draft, self.clock.now())?;

        companies.increment_invoice_counter()?;

        self.invoices.push(invoice.clone());
        tracing::info!(
            invoice_id = %invoice.id_typed(),
            company_id = %invoice.company_id(),
            invoice_number = invoice.invoice_number(),
            total = invoice.total(),
            "invoice created"
        );
        self.save();
        Ok(invoice)
    }

    /// Merge `patch` into an invoice; totals follow the merged items.
    pub fn update(&mut self, id: &InvoiceId, patch: InvoicePatch) -> DomainResult<Invoice> {
        let now = self.clock.now();
        let invoice = self
            .invoices
            .iter_mut()
            .find(|i| i.id_typed() == id)
            .ok_or_else(|| DomainError::not_found(format!("invoice {id}")))?;
        invoice.apply_patch(patch, now)?;
        let updated = invoice.clone();
        tracing::info!(invoice_id = %id, status = %updated.status(), "invoice updated");
        self.save();
        Ok(updated)
    }

    /// Remove an invoice. The owning company's counter is never decremented.
    pub fn delete(&mut self, id: &InvoiceId) -> DomainResult<()> {
        let idx = position_of(&self.invoices, id)
            .ok_or_else(|| DomainError::not_found(format!("invoice {id}")))?;
        let removed = self.invoices.remove(idx);
        tracing::info!(
            invoice_id = %id,
            invoice_number = removed.invoice_number(),
            "invoice deleted"
        );
        self.save();
        Ok(())
    }

    /// Remove every invoice of `company_id`; returns how many went.
    pub fn delete_by_company(&mut self, company_id: &CompanyId) -> usize {
        let before = self.invoices.len();
        self.invoices.retain(|i| i.company_id() != company_id);
        let removed = before - self.invoices.len();
        if removed > 0 {
            tracing::info!(company_id = %company_id, removed, "invoices deleted with company");
            self.save();
        }
        removed
    }

    /// Blank line item for a new form row.
    pub fn create_empty_item() -> InvoiceItem {
        InvoiceItem::empty()
    }

    pub fn drain_persistence_warnings(&mut self) -> Vec<PersistenceWarning> {
        std::mem::take(&mut self.warnings)
    }

    fn warn(&mut self, error: StorageError) {
        tracing::warn!(key = INVOICES_KEY, error = %error, "invoice snapshot persistence failed");
        self.warnings.push(PersistenceWarning {
            key: INVOICES_KEY.to_string(),
            error,
        });
    }
}
