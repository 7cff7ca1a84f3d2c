use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use invoicemint_core::{CompanyId, DomainError, DomainResult, Entity, coerce};

use crate::numbering::format_invoice_number;

pub const DEFAULT_CURRENCY: &str = "$";

/// Payment terms (days) assumed for records that predate the field.
pub const DEFAULT_PAYMENT_TERMS: u32 = 30;

/// Longest accepted payment terms, in days.
pub const MAX_PAYMENT_TERMS: u32 = 3650;

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_payment_terms() -> u32 {
    DEFAULT_PAYMENT_TERMS
}

fn default_counter() -> u32 {
    1
}

/// Company profile.
///
/// Field names on the wire match the snapshot layout (`invoicePrefix`,
/// `invoiceCounter`, ...). Every field is coerced on decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    id: CompanyId,
    #[serde(deserialize_with = "coerce::text")]
    name: String,
    #[serde(default, deserialize_with = "coerce::text")]
    address: String,
    #[serde(default, deserialize_with = "coerce::text")]
    invoice_prefix: String,
    #[serde(default = "default_counter", deserialize_with = "coerce::count")]
    invoice_counter: u32,
    #[serde(default = "default_currency", deserialize_with = "coerce::text")]
    currency: String,
    #[serde(default, deserialize_with = "coerce::text")]
    notes: String,
    #[serde(default = "default_payment_terms", deserialize_with = "coerce::count")]
    payment_terms: u32,
    #[serde(deserialize_with = "coerce::timestamp")]
    created_at: DateTime<Utc>,
    #[serde(deserialize_with = "coerce::timestamp")]
    updated_at: DateTime<Utc>,
}

/// Input for creating a company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyDraft {
    pub name: String,
    pub address: String,
    pub invoice_prefix: String,
    /// Next sequence number to assign.
    pub invoice_counter: u32,
    pub currency: String,
    /// Default invoice notes.
    pub notes: String,
    /// Days between issue date and due date.
    pub payment_terms: u32,
}

impl CompanyDraft {
    /// Draft with the usual defaults: counter 1, `$`, 30 days.
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        invoice_prefix: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            invoice_prefix: invoice_prefix.into(),
            invoice_counter: 1,
            currency: DEFAULT_CURRENCY.to_string(),
            notes: String::new(),
            payment_terms: DEFAULT_PAYMENT_TERMS,
        }
    }
}

/// Partial update of a company. `None` keeps the existing value.
///
/// The invoice counter is deliberately absent: it only moves when an invoice
/// is created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyPatch {
    pub name: Option<String>,
    pub address: Option<String>,
    pub invoice_prefix: Option<String>,
    pub currency: Option<String>,
    pub notes: Option<String>,
    pub payment_terms: Option<u32>,
}

impl CompanyPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn require_text(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("company {field} is required")));
    }
    Ok(())
}

fn require_positive(field: &str, value: u32) -> DomainResult<()> {
    if value == 0 {
        return Err(DomainError::validation(format!(
            "company {field} must be a positive integer"
        )));
    }
    Ok(())
}

impl Company {
    /// Build a new company from a draft, stamping both timestamps with `now`.
    pub fn create(id: CompanyId, draft: CompanyDraft, now: DateTime<Utc>) -> DomainResult<Self> {
        let company = Self {
            id,
            name: draft.name,
            address: draft.address,
            invoice_prefix: draft.invoice_prefix,
            invoice_counter: draft.invoice_counter,
            currency: draft.currency,
            notes: draft.notes,
            payment_terms: draft.payment_terms,
            created_at: now,
            updated_at: now,
        };
        company.validate()?;
        Ok(company)
    }

    pub fn validate(&self) -> DomainResult<()> {
        require_text("name", &self.name)?;
        require_text("address", &self.address)?;
        require_text("invoice prefix", &self.invoice_prefix)?;
        require_text("currency", &self.currency)?;
        require_positive("invoice counter", self.invoice_counter)?;
        require_positive("payment terms", self.payment_terms)?;
        if self.payment_terms > MAX_PAYMENT_TERMS {
            return Err(DomainError::validation(format!(
                "company payment terms must be at most {MAX_PAYMENT_TERMS} days"
            )));
        }
        Ok(())
    }

    /// Merge `patch` into this company. All-or-nothing: on validation failure
    /// the company is left untouched.
    pub fn apply_patch(&mut self, patch: CompanyPatch, now: DateTime<Utc>) -> DomainResult<()> {
        let mut merged = self.clone();
        if let Some(name) = patch.name {
            merged.name = name;
        }
        if let Some(address) = patch.address {
            merged.address = address;
        }
        if let Some(prefix) = patch.invoice_prefix {
            merged.invoice_prefix = prefix;
        }
        if let Some(currency) = patch.currency {
            merged.currency = currency;
        }
        if let Some(notes) = patch.notes {
            merged.notes = notes;
        }
        if let Some(terms) = patch.payment_terms {
            merged.payment_terms = terms;
        }
        merged.validate()?;
        merged.updated_at = now;
        *self = merged;
        Ok(())
    }

    /// Advance the invoice counter by exactly one.
    pub fn advance_counter(&mut self, now: DateTime<Utc>) {
        self.invoice_counter = self.invoice_counter.saturating_add(1);
        self.updated_at = now;
    }

    /// Invoice number the next created invoice will receive.
    pub fn next_invoice_number(&self) -> String {
        format_invoice_number(&self.invoice_prefix, self.invoice_counter)
    }

    /// Repair fields a decoded record may carry out of range.
    ///
    /// Counter and payment terms are lifted to their minimum instead of
    /// rejecting the whole snapshot.
    pub fn normalized(mut self) -> Self {
        if self.invoice_counter == 0 {
            self.invoice_counter = 1;
        }
        if self.payment_terms == 0 {
            self.payment_terms = DEFAULT_PAYMENT_TERMS;
        }
        self.payment_terms = self.payment_terms.min(MAX_PAYMENT_TERMS);
        if self.currency.trim().is_empty() {
            self.currency = default_currency();
        }
        self
    }

    pub fn id_typed(&self) -> &CompanyId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn invoice_prefix(&self) -> &str {
        &self.invoice_prefix
    }

    pub fn invoice_counter(&self) -> u32 {
        self.invoice_counter
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn payment_terms(&self) -> u32 {
        self.payment_terms
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl Entity for Company {
    type Id = CompanyId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
