//! Invoice number generation.

/// Minimum width of the numeric part; longer counters are never truncated.
pub const COUNTER_WIDTH: usize = 3;

/// `prefix` followed by the counter zero-padded to [`COUNTER_WIDTH`] digits.
pub fn format_invoice_number(prefix: &str, counter: u32) -> String {
    format!("{prefix}{counter:0width$}", width = COUNTER_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn pads_to_three_digits() {
        assert_eq!(format_invoice_number("INV-", 7), "INV-007");
        assert_eq!(format_invoice_number("A-", 1), "A-001");
        assert_eq!(format_invoice_number("", 42), "042");
    }

    #[test]
    fn grows_past_three_digits() {
        assert_eq!(format_invoice_number("INV-", 1042), "INV-1042");
        assert_eq!(format_invoice_number("INV-", 999), "INV-999");
    }

    proptest! {
        /// Property: the numeric suffix always parses back to the counter.
        #[test]
        fn suffix_round_trips_counter(prefix in "[A-Z]{0,4}-?", counter in 1u32..10_000_000) {
            let number = format_invoice_number(&prefix, counter);
            let suffix = number.strip_prefix(prefix.as_str()).unwrap();
            prop_assert!(suffix.len() >= COUNTER_WIDTH);
            prop_assert_eq!(suffix.parse::<u32>().unwrap(), counter);
        }
    }
}
