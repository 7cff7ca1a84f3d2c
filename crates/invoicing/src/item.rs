use serde::{Deserialize, Serialize};

use invoicemint_core::{DomainError, DomainResult, Entity, ItemId, coerce};

/// One row of an invoice.
///
/// `total` is derived and never authoritative: it is recomputed from
/// `quantity * unit_price` whenever totals are computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItem {
    pub id: ItemId,
    #[serde(default, deserialize_with = "coerce::text")]
    pub description: String,
    #[serde(deserialize_with = "coerce::number")]
    pub quantity: f64,
    #[serde(deserialize_with = "coerce::number")]
    pub unit_price: f64,
    #[serde(default, deserialize_with = "coerce::number")]
    pub total: f64,
}

impl InvoiceItem {
    pub fn new(description: impl Into<String>, quantity: f64, unit_price: f64) -> Self {
        Self {
            id: ItemId::new(),
            description: description.into(),
            quantity,
            unit_price,
            total: quantity * unit_price,
        }
    }

    /// Blank row: quantity 1, unit price 0.
    pub fn empty() -> Self {
        Self::new("", 1.0, 0.0)
    }

    pub fn line_total(&self) -> f64 {
        self.quantity * self.unit_price
    }

    pub fn recompute(&mut self) {
        self.total = self.line_total();
    }

    fn problem(&self) -> Option<&'static str> {
        if self.description.trim().is_empty() {
            Some("description is required")
        } else if !self.quantity.is_finite() || self.quantity <= 0.0 {
            Some("quantity must be positive")
        } else if !self.unit_price.is_finite() || self.unit_price < 0.0 {
            Some("unit price must not be negative")
        } else {
            None
        }
    }
}

impl Entity for InvoiceItem {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Check an item list: at least one item, every item valid, ids unique.
///
/// The error names the first offending item by position and id.
pub fn validate_items(items: &[InvoiceItem]) -> DomainResult<()> {
    if items.is_empty() {
        return Err(DomainError::validation("invoice must contain at least one item"));
    }
    for (idx, item) in items.iter().enumerate() {
        if let Some(reason) = item.problem() {
            return Err(DomainError::validation(format!(
                "item {} ({}): {reason}",
                idx + 1,
                item.id
            )));
        }
        if items[..idx].iter().any(|other| other.id == item.id) {
            return Err(DomainError::validation(format!(
                "item {} ({}): duplicate item id",
                idx + 1,
                item.id
            )));
        }
    }
    Ok(())
}
