//! Print/export collaborator contract.
//!
//! The stores hand a renderer one fully computed invoice together with its
//! owning company; layout is the renderer's business.

use invoicemint_companies::Company;
use invoicemint_invoicing::{Invoice, format_money};

#[derive(Debug, Clone, PartialEq)]
pub struct PrintContext {
    pub invoice: Invoice,
    pub company: Company,
}

impl PrintContext {
    /// `amount` in the company's currency, two decimals.
    pub fn money(&self, amount: f64) -> String {
        format_money(self.company.currency(), amount)
    }
}

/// Turns a [`PrintContext`] into a human-readable document.
pub trait InvoiceRenderer {
    type Output;

    fn render(&self, ctx: &PrintContext) -> Self::Output;
}
