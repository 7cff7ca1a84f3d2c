//! Invoice total computation.
//!
//! Totals are always derived from item source fields (`quantity`,
//! `unit_price`); caller-supplied item or invoice totals are ignored.

use serde::{Deserialize, Serialize};

use crate::item::InvoiceItem;

/// Derived amounts of an invoice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub subtotal: f64,
    pub tax_amount: f64,
    pub total: f64,
}

/// Subtotal, tax and total for `items` at `tax_rate_percent`.
pub fn compute_totals(items: &[InvoiceItem], tax_rate_percent: f64) -> Totals {
    let subtotal: f64 = items.iter().map(InvoiceItem::line_total).sum();
    let tax_amount = subtotal * (tax_rate_percent / 100.0);
    Totals {
        subtotal,
        tax_amount,
        total: subtotal + tax_amount,
    }
}

/// Refresh every item's `total`, then compute invoice totals.
pub fn recompute_totals(items: &mut [InvoiceItem], tax_rate_percent: f64) -> Totals {
    items.iter_mut().for_each(InvoiceItem::recompute);
    compute_totals(items, tax_rate_percent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn item(quantity: f64, unit_price: f64) -> InvoiceItem {
        InvoiceItem::new("line", quantity, unit_price)
    }

    #[test]
    fn two_at_fifty_with_ten_percent_tax() {
        let totals = compute_totals(&[item(2.0, 50.0)], 10.0);
        assert_eq!(totals.subtotal, 100.0);
        assert_eq!(totals.tax_amount, 10.0);
        assert_eq!(totals.total, 110.0);
    }

    #[test]
    fn stale_item_totals_are_ignored() {
        let mut items = vec![item(3.0, 4.0)];
        items[0].total = 1_000.0;
        assert_eq!(compute_totals(&items, 0.0).subtotal, 12.0);

        let totals = recompute_totals(&mut items, 0.0);
        assert_eq!(items[0].total, 12.0);
        assert_eq!(totals.total, 12.0);
    }

    #[test]
    fn no_items_means_zero() {
        assert_eq!(compute_totals(&[], 25.0), Totals::default());
    }

    fn arb_items() -> impl Strategy<Value = Vec<InvoiceItem>> {
        prop::collection::vec((0.01f64..1_000.0, 0.0f64..10_000.0), 1..20)
            .prop_map(|rows| rows.into_iter().map(|(q, p)| item(q, p)).collect())
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: total is exactly subtotal plus tax.
        #[test]
        fn total_is_subtotal_plus_tax(items in arb_items(), rate in 0.0f64..=100.0) {
            let t = compute_totals(&items, rate);
            prop_assert_eq!(t.total, t.subtotal + t.tax_amount);
            prop_assert!(t.tax_amount >= 0.0);
            prop_assert!(t.tax_amount <= t.subtotal + f64::EPSILON);
        }

        /// Property: after a recompute pass every item total equals quantity * unit price,
        /// whatever value it held before.
        #[test]
        fn recompute_overwrites_item_totals(
            mut items in arb_items(),
            junk in -1e6f64..1e6,
            rate in 0.0f64..=100.0,
        ) {
            for it in items.iter_mut() {
                it.total = junk;
            }
            recompute_totals(&mut items, rate);
            for it in &items {
                prop_assert_eq!(it.total, it.quantity * it.unit_price);
            }
        }
    }
}
