//! Invoicing domain module.
//!
//! This crate contains business rules for invoices and their line items,
//! implemented purely as deterministic domain logic (no IO, no storage).

pub mod invoice;
pub mod item;
pub mod summary;
pub mod totals;

pub use invoice::{Customer, Invoice, InvoiceDraft, InvoicePatch, InvoiceStatus};
pub use item::{InvoiceItem, validate_items};
pub use summary::{CompanySummary, format_money, matches_search};
pub use totals::{Totals, compute_totals, recompute_totals};
