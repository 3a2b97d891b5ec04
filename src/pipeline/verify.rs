//! Consistency verification
//!
//! Recomputes the item subtotal and compares it to the declared one. The
//! result is advisory: a mismatch marks the receipt, it never blocks it.

use crate::extraction::ReceiptDraft;

/// Round to two decimals, the precision every monetary value is stored at.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `true` iff the rounded item sum equals the declared subtotal exactly.
///
/// The subtotal is assumed pre-rounded to two decimals by the extraction
/// contract. Computed once at ingestion and stored; never recomputed.
pub fn is_clean(draft: &ReceiptDraft) -> bool {
    let sum: f64 = draft.items.iter().map(|i| i.cost).sum();
    round2(sum) == draft.subtotal
}

/// Tax is whatever the total carries beyond the subtotal.
pub fn tax(draft: &ReceiptDraft) -> f64 {
    round2(draft.total - draft.subtotal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::DraftItem;

    fn draft(costs: &[f64], subtotal: f64, total: f64) -> ReceiptDraft {
        ReceiptDraft {
            name: "Corner Cafe".into(),
            date: "03-14-2025".into(),
            merchant_address: String::new(),
            merchant_website: String::new(),
            payment_method: String::new(),
            items: costs
                .iter()
                .enumerate()
                .map(|(i, &cost)| DraftItem {
                    description: format!("item {}", i),
                    cost,
                    line_number: i,
                })
                .collect(),
            subtotal,
            total,
        }
    }

    #[test]
    fn matching_sum_is_clean() {
        assert!(is_clean(&draft(&[2.50, 1.75], 4.25, 4.25)));
    }

    #[test]
    fn mismatched_sum_is_not_clean() {
        assert!(!is_clean(&draft(&[2.50, 1.75], 4.00, 4.25)));
    }

    #[test]
    fn float_accumulation_is_rounded_before_compare() {
        // 0.1 + 0.2 famously isn't 0.3 in binary floats.
        assert!(is_clean(&draft(&[0.1, 0.2], 0.30, 0.33)));
    }

    #[test]
    fn empty_item_list_sums_to_zero() {
        assert!(is_clean(&draft(&[], 0.0, 0.0)));
        assert!(!is_clean(&draft(&[], 1.0, 1.0)));
    }

    #[test]
    fn tax_is_rounded_difference() {
        assert_eq!(tax(&draft(&[2.50, 1.75], 4.25, 4.25)), 0.00);
        assert_eq!(tax(&draft(&[2.50, 1.75], 4.25, 4.63)), 0.38);
        assert_eq!(tax(&draft(&[], 4.00, 4.25)), 0.25);
    }

    #[test]
    fn round2_truncates_sub_cent_noise() {
        assert_eq!(round2(2.567), 2.57);
        assert_eq!(round2(4.249999999), 4.25);
        assert_eq!(round2(0.1 + 0.2), 0.3);
    }
}
