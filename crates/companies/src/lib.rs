//! Company profiles.
//!
//! A company is the issuing context for invoices: it carries the numbering
//! prefix and counter, the display currency and the default payment terms.

pub mod company;
pub mod numbering;

pub use company::{
    Company, CompanyDraft, CompanyPatch, DEFAULT_CURRENCY, DEFAULT_PAYMENT_TERMS, MAX_PAYMENT_TERMS,
};
pub use numbering::format_invoice_number;
