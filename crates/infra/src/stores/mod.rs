//! In-memory stores backed by whole-state snapshots.
//!
//! Every mutating operation changes memory first, then writes the full
//! snapshot. A failed write never rolls the mutation back: it is logged and
//! queued as a [`PersistenceWarning`](crate::snapshot::PersistenceWarning).

pub mod company_store;
pub mod invoice_store;

pub use company_store::CompanyStore;
pub use invoice_store::InvoiceStore;

use invoicemint_companies::Company;
use invoicemint_core::DomainResult;

/// What invoice creation needs from the company side: the current company
/// and a way to advance its counter.
pub trait CompanyDirectory {
    fn current_company(&self) -> Option<&Company>;

    /// Advance the current company's counter by exactly one.
    fn increment_invoice_counter(&mut self) -> DomainResult<()>;
}
