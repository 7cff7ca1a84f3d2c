//! Read-side helpers over a company's invoices: dashboard figures, search
//! and money display.

use serde::Serialize;

use crate::invoice::{Invoice, InvoiceStatus};

/// How many invoices the dashboard lists as "recent".
pub const RECENT_LIMIT: usize = 5;

/// Dashboard figures for one company.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompanySummary {
    pub invoice_count: usize,
    pub total_amount: f64,
    pub paid_count: usize,
    pub paid_amount: f64,
    pub overdue_count: usize,
    pub overdue_amount: f64,
    /// Most recently created first, at most [`RECENT_LIMIT`].
    pub recent: Vec<Invoice>,
}

impl CompanySummary {
    pub fn from_invoices<'a>(invoices: impl IntoIterator<Item = &'a Invoice>) -> Self {
        let mut summary = Self::default();
        let mut all: Vec<&Invoice> = Vec::new();

        for invoice in invoices {
            summary.invoice_count += 1;
            summary.total_amount += invoice.total();
            match invoice.status() {
                InvoiceStatus::Paid => {
                    summary.paid_count += 1;
                    summary.paid_amount += invoice.total();
                }
                InvoiceStatus::Overdue => {
                    summary.overdue_count += 1;
                    summary.overdue_amount += invoice.total();
                }
                InvoiceStatus::Draft | InvoiceStatus::Sent => {}
            }
            all.push(invoice);
        }

        // Stable sort: equal timestamps keep insertion order.
        all.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        summary.recent = all.into_iter().take(RECENT_LIMIT).cloned().collect();
        summary
    }

    /// Amount neither paid nor flagged overdue.
    pub fn outstanding_amount(&self) -> f64 {
        self.total_amount - self.paid_amount - self.overdue_amount
    }
}

/// Case-insensitive match on invoice number or customer name, or `term`
/// appearing in the plain textual total (`110`, `110.5`).
pub fn matches_search(invoice: &Invoice, term: &str) -> bool {
    let term = term.trim();
    if term.is_empty() {
        return true;
    }
    let needle = term.to_lowercase();
    invoice.invoice_number().to_lowercase().contains(&needle)
        || invoice.customer().name.to_lowercase().contains(&needle)
        || invoice.total().to_string().contains(term)
}

/// Currency symbol followed by the amount with two decimals.
pub fn format_money(currency: &str, amount: f64) -> String {
    format!("{currency}{amount:.2}")
}
