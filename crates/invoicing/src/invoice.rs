use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use invoicemint_companies::Company;
use invoicemint_core::{CompanyId, DomainError, DomainResult, Entity, InvoiceId, coerce};

use crate::item::{InvoiceItem, validate_items};
use crate::totals::{Totals, recompute_totals};

/// Invoice status label.
///
/// Purely user-set: every transition is allowed and none happens
/// automatically (an invoice past its due date stays `sent` until the user
/// marks it `overdue`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Sent,
    Paid,
    Overdue,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 4] = [Self::Draft, Self::Sent, Self::Paid, Self::Overdue];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Paid => "paid",
            Self::Overdue => "overdue",
        }
    }
}

impl core::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for InvoiceStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::validation(format!("unknown invoice status: {s}")))
    }
}

impl<'de> Deserialize<'de> for InvoiceStatus {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = coerce::text(d)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Billed party, embedded in the invoice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(deserialize_with = "coerce::text")]
    pub name: String,
    #[serde(default, deserialize_with = "coerce::text")]
    pub address: String,
    #[serde(
        default,
        deserialize_with = "coerce::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub email: Option<String>,
    #[serde(
        default,
        deserialize_with = "coerce::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub phone: Option<String>,
}

impl Customer {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            email: None,
            phone: None,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("customer name is required"));
        }
        if self.address.trim().is_empty() {
            return Err(DomainError::validation("customer address is required"));
        }
        if let Some(email) = self.email.as_deref().filter(|e| !e.trim().is_empty()) {
            if !looks_like_email(email.trim()) {
                return Err(DomainError::validation(format!(
                    "customer email is malformed: {email}"
                )));
            }
        }
        Ok(())
    }
}

/// `local@domain.tld` with no whitespace.
fn looks_like_email(s: &str) -> bool {
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

fn validate_tax_rate(rate: f64) -> DomainResult<()> {
    if !rate.is_finite() || !(0.0..=100.0).contains(&rate) {
        return Err(DomainError::validation(format!(
            "tax rate must be between 0 and 100, got {rate}"
        )));
    }
    Ok(())
}

/// `date` plus `terms` days; out-of-range results are a validation error.
fn due_date_after(date: NaiveDate, terms: u32) -> DomainResult<NaiveDate> {
    TimeDelta::try_days(i64::from(terms))
        .and_then(|delta| date.checked_add_signed(delta))
        .ok_or_else(|| DomainError::validation("due date out of range"))
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty())
}

/// Input for creating an invoice against the current company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceDraft {
    /// User-supplied number; `None` or blank means "generate from the company counter".
    pub invoice_number: Option<String>,
    pub date: NaiveDate,
    /// `None` means `date + company.payment_terms` days.
    pub due_date: Option<NaiveDate>,
    pub customer: Customer,
    pub items: Vec<InvoiceItem>,
    pub tax_rate: f64,
    /// `None` means the company's default notes.
    pub notes: Option<String>,
    pub status: InvoiceStatus,
}

impl InvoiceDraft {
    pub fn new(date: NaiveDate, customer: Customer, items: Vec<InvoiceItem>) -> Self {
        Self {
            invoice_number: None,
            date,
            due_date: None,
            customer,
            items,
            tax_rate: 0.0,
            notes: None,
            status: InvoiceStatus::Draft,
        }
    }
}

/// Partial update of an invoice. `None` keeps the existing value.
///
/// The owning company is not part of the patch: invoices are never
/// reassigned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoicePatch {
    pub invoice_number: Option<String>,
    pub date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub customer: Option<Customer>,
    pub items: Option<Vec<InvoiceItem>>,
    pub tax_rate: Option<f64>,
    /// `Some("")` clears the notes.
    pub notes: Option<String>,
    pub status: Option<InvoiceStatus>,
}

impl InvoicePatch {
    pub fn status(status: InvoiceStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    fn touches_totals(&self) -> bool {
        self.items.is_some() || self.tax_rate.is_some()
    }
}

/// Invoice record.
///
/// `subtotal`, `tax_amount` and `total` are stored for display and search but
/// are always derived from `items` and `tax_rate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    id: InvoiceId,
    company_id: CompanyId,
    #[serde(deserialize_with = "coerce::text")]
    invoice_number: String,
    #[serde(deserialize_with = "coerce::date")]
    date: NaiveDate,
    #[serde(deserialize_with = "coerce::date")]
    due_date: NaiveDate,
    customer: Customer,
    items: Vec<InvoiceItem>,
    #[serde(default, deserialize_with = "coerce::number")]
    subtotal: f64,
    #[serde(default, deserialize_with = "coerce::number")]
    tax_rate: f64,
    #[serde(default, deserialize_with = "coerce::number")]
    tax_amount: f64,
    #[serde(default, deserialize_with = "coerce::number")]
    total: f64,
    #[serde(
        default,
        deserialize_with = "coerce::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    notes: Option<String>,
    #[serde(default)]
    status: InvoiceStatus,
    #[serde(deserialize_with = "coerce::timestamp")]
    created_at: DateTime<Utc>,
    #[serde(deserialize_with = "coerce::timestamp")]
    updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Build an invoice for `company` from `draft`.
    ///
    /// Validates the draft, then fills in the defaults the company provides:
    /// the invoice number (from its current counter), the due date (from its
    /// payment terms) and the notes. Does not advance the counter.
    pub fn issue(
        id: InvoiceId,
        company: &Company,
        draft: InvoiceDraft,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        validate_items(&draft.items)?;
        draft.customer.validate()?;
        validate_tax_rate(draft.tax_rate)?;

        let invoice_number = non_blank(draft.invoice_number)
            .unwrap_or_else(|| company.next_invoice_number());
        let due_date = match draft.due_date {
            Some(due_date) => due_date,
            None => due_date_after(draft.date, company.payment_terms())?,
        };
        let notes = match draft.notes {
            Some(notes) => non_blank(Some(notes)),
            None => non_blank(Some(company.notes().to_string())),
        };

        let mut invoice = Self {
            id,
            company_id: company.id_typed().clone(),
            invoice_number,
            date: draft.date,
            due_date,
            customer: draft.customer,
            items: draft.items,
            subtotal: 0.0,
            tax_rate: draft.tax_rate,
            tax_amount: 0.0,
            total: 0.0,
            notes,
            status: draft.status,
            created_at: now,
            updated_at: now,
        };
        invoice.recompute();
        Ok(invoice)
    }

    /// Merge `patch` into this invoice. All-or-nothing: on validation failure
    /// the invoice is left untouched.
    ///
    /// Totals are recomputed from the merged items when the patch carries
    /// items or a tax rate.
    pub fn apply_patch(&mut self, patch: InvoicePatch, now: DateTime<Utc>) -> DomainResult<()> {
        let recompute = patch.touches_totals();
        let mut merged = self.clone();

        if let Some(number) = patch.invoice_number {
            if number.trim().is_empty() {
                return Err(DomainError::validation("invoice number is required"));
            }
            merged.invoice_number = number;
        }
        if let Some(date) = patch.date {
            merged.date = date;
        }
        if let Some(due_date) = patch.due_date {
            merged.due_date = due_date;
        }
        if let Some(customer) = patch.customer {
            customer.validate()?;
            merged.customer = customer;
        }
        if let Some(items) = patch.items {
            validate_items(&items)?;
            merged.items = items;
        }
        if let Some(rate) = patch.tax_rate {
            validate_tax_rate(rate)?;
            merged.tax_rate = rate;
        }
        if let Some(notes) = patch.notes {
            merged.notes = non_blank(Some(notes));
        }
        if let Some(status) = patch.status {
            merged.status = status;
        }

        if recompute {
            merged.recompute();
        }
        merged.updated_at = now;
        *self = merged;
        Ok(())
    }

    /// Refresh item totals and invoice totals from source fields.
    pub fn recompute(&mut self) -> Totals {
        let totals = recompute_totals(&mut self.items, self.tax_rate);
        self.subtotal = totals.subtotal;
        self.tax_amount = totals.tax_amount;
        self.total = totals.total;
        totals
    }

    /// Decoded records are made internally consistent before use.
    pub fn normalized(mut self) -> Self {
        self.recompute();
        self
    }

    /// Display helper: due date has passed and the invoice is not paid.
    ///
    /// Never changes `status`.
    pub fn is_past_due(&self, today: NaiveDate) -> bool {
        self.status != InvoiceStatus::Paid && self.due_date < today
    }

    pub fn id_typed(&self) -> &InvoiceId {
        &self.id
    }

    pub fn company_id(&self) -> &CompanyId {
        &self.company_id
    }

    pub fn invoice_number(&self) -> &str {
        &self.invoice_number
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    pub fn customer(&self) -> &Customer {
        &self.customer
    }

    pub fn items(&self) -> &[InvoiceItem] {
        &self.items
    }

    pub fn subtotal(&self) -> f64 {
        self.subtotal
    }

    pub fn tax_rate(&self) -> f64 {
        self.tax_rate
    }

    pub fn tax_amount(&self) -> f64 {
        self.tax_amount
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn totals(&self) -> Totals {
        Totals {
            subtotal: self.subtotal,
            tax_amount: self.tax_amount,
            total: self.total,
        }
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn status(&self) -> InvoiceStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl Entity for Invoice {
    type Id = InvoiceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
