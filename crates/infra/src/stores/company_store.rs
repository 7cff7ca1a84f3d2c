use std::sync::Arc;

use invoicemint_companies::{Company, CompanyDraft, CompanyPatch};
use invoicemint_core::{
    Clock, CompanyId, DomainError, DomainResult, SystemClock, entity::position_of,
};

use crate::snapshot::{self, COMPANIES_KEY, CURRENT_COMPANY_KEY, PersistenceWarning};
use crate::storage::{KeyValueStorage, StorageError};

use super::CompanyDirectory;

/// Company profiles plus the "current company" pointer.
///
/// The list keeps insertion order. The pointer is persisted as a full record
/// (`currentCompany`), but on load it is resolved by id against the list,
/// which is authoritative.
pub struct CompanyStore<S> {
    storage: S,
    clock: Arc<dyn Clock>,
    companies: Vec<Company>,
    current: Option<CompanyId>,
    warnings: Vec<PersistenceWarning>,
}

impl<S: KeyValueStorage> CompanyStore<S> {
    /// Open the store and load its snapshot.
    pub fn open(storage: S) -> Self {
        Self::open_with_clock(storage, Arc::new(SystemClock))
    }

    pub fn open_with_clock(storage: S, clock: Arc<dyn Clock>) -> Self {
        let mut store = Self {
            storage,
            clock,
            companies: Vec::new(),
            current: None,
            warnings: Vec::new(),
        };
        store.load();
        store
    }

    /// Replace in-memory state with the persisted snapshot.
    ///
    /// Unreadable data is reported as a warning and skipped.
    pub fn load(&mut self) {
        let decoded = match snapshot::read_records::<_, Company>(&self.storage, COMPANIES_KEY) {
            Ok(decoded) => decoded,
            Err(error) => {
                self.warn(COMPANIES_KEY, error);
                Default::default()
            }
        };
        for error in decoded.rejected {
            self.warn(COMPANIES_KEY, error);
        }
        self.companies = decoded
            .records
            .into_iter()
            .map(Company::normalized)
            .collect();

        let pointer = snapshot::read_optional::<_, Company>(&self.storage, CURRENT_COMPANY_KEY);
        let pointer = match pointer {
            Ok(pointer) => pointer,
            Err(error) => {
                self.warn(CURRENT_COMPANY_KEY, error);
                None
            }
        };
        self.current = pointer
            .map(|c| c.id_typed().clone())
            .filter(|id| self.get(id).is_some())
            .or_else(|| self.companies.first().map(|c| c.id_typed().clone()));

        tracing::debug!(
            companies = self.companies.len(),
            current = ?self.current,
            "company snapshot loaded"
        );
    }

    /// Write the company list and the current-company pointer.
    pub fn save(&mut self) {
        if let Err(error) = snapshot::write(&self.storage, COMPANIES_KEY, &self.companies) {
            self.warn(COMPANIES_KEY, error);
        }
        let current = self.current();
        if let Err(error) = snapshot::write(&self.storage, CURRENT_COMPANY_KEY, &current) {
            self.warn(CURRENT_COMPANY_KEY, error);
        }
    }

    pub fn list(&self) -> &[Company] {
        &self.companies
    }

    pub fn get(&self, id: &CompanyId) -> Option<&Company> {
        self.companies.iter().find(|c| c.id_typed() == id)
    }

    pub fn current(&self) -> Option<&Company> {
        self.current.as_ref().and_then(|id| self.get(id))
    }

    /// Add a company at the end of the list. Becomes current if none was.
    pub fn create(&mut self, draft: CompanyDraft) -> DomainResult<Company> {
        let company = Company::create(CompanyId::new(), draft, self.clock.now())?;
        self.companies.push(company.clone());
        if self.current.is_none() {
            self.current = Some(company.id_typed().clone());
        }
        tracing::info!(company_id = %company.id_typed(), name = company.name(), "company created");
        self.save();
        Ok(company)
    }

    /// Merge `patch` into a company. The current pointer follows by id, so
    /// it always sees the new value.
    pub fn update(&mut self, id: &CompanyId, patch: CompanyPatch) -> DomainResult<Company> {
        let now = self.clock.now();
        let company = self.find_mut(id)?;
        company.apply_patch(patch, now)?;
        let updated = company.clone();
        tracing::info!(company_id = %id, "company updated");
        self.save();
        Ok(updated)
    }

    /// Remove a company. Its invoices are not touched here.
    ///
    /// If it was current, the first remaining company (or none) becomes current.
    pub fn delete(&mut self, id: &CompanyId) -> DomainResult<()> {
        let idx = position_of(&self.companies, id)
            .ok_or_else(|| DomainError::not_found(format!("company {id}")))?;
        let removed = self.companies.remove(idx);
        if self.current.as_ref() == Some(id) {
            self.current = self.companies.first().map(|c| c.id_typed().clone());
        }
        tracing::info!(company_id = %id, name = removed.name(), "company deleted");
        self.save();
        Ok(())
    }

    pub fn set_current(&mut self, id: &CompanyId) -> DomainResult<()> {
        if self.get(id).is_none() {
            return Err(DomainError::not_found(format!("company {id}")));
        }
        self.current = Some(id.clone());
        self.save();
        Ok(())
    }

    /// Advance the current company's counter by exactly one.
    pub fn increment_invoice_counter(&mut self) -> DomainResult<()> {
        let id = self.current.clone().ok_or(DomainError::NoCompanySelected)?;
        let now = self.clock.now();
        let company = self.find_mut(&id)?;
        company.advance_counter(now);
        tracing::debug!(
            company_id = %id,
            counter = company.invoice_counter(),
            "invoice counter advanced"
        );
        self.save();
        Ok(())
    }

    /// Take the persistence failures queued since the last call.
    pub fn drain_persistence_warnings(&mut self) -> Vec<PersistenceWarning> {
        std::mem::take(&mut self.warnings)
    }

    fn find_mut(&mut self, id: &CompanyId) -> DomainResult<&mut Company> {
        self.companies
            .iter_mut()
            .find(|c| c.id_typed() == id)
            .ok_or_else(|| DomainError::not_found(format!("company {id}")))
    }

    fn warn(&mut self, key: &str, error: StorageError) {
        tracing::warn!(key, error = %error, "company snapshot persistence failed");
        self.warnings.push(PersistenceWarning {
            key: key.to_string(),
            error,
        });
    }
}

impl<S: KeyValueStorage> CompanyDirectory for CompanyStore<S> {
    fn current_company(&self) -> Option<&Company> {
        self.current()
    }

    fn increment_invoice_counter(&mut self) -> DomainResult<()> {
        CompanyStore::increment_invoice_counter(self)
    }
}
