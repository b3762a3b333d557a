//! Property-based tests for button layout
//!
//! These tests verify the packing invariants hold for arbitrary inputs.

use super::*;
use proptest::prelude::*;

fn arb_pattern() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(1usize..5, 1..6)
}

proptest! {
    #[test]
    fn prop_even_row_count(n in 0usize..64, per_row in 1usize..=MAX_BUTTONS_PER_ROW) {
        let items: Vec<usize> = (0..n).collect();
        let rows = pack_even(items, per_row);
        prop_assert_eq!(rows.len(), n.div_ceil(per_row));
    }

    #[test]
    fn prop_even_rows_full_except_last(n in 1usize..64, per_row in 1usize..=MAX_BUTTONS_PER_ROW) {
        let items: Vec<usize> = (0..n).collect();
        let rows = pack_even(items, per_row);
        let (last, full) = rows.split_last().unwrap();
        for row in full {
            prop_assert_eq!(row.len(), per_row);
        }
        prop_assert!(!last.is_empty() && last.len() <= per_row);
    }

    #[test]
    fn prop_even_preserves_order(n in 0usize..64, per_row in 0usize..12) {
        let items: Vec<usize> = (0..n).collect();
        let flat: Vec<usize> = pack_even(items.clone(), per_row).into_iter().flatten().collect();
        prop_assert_eq!(flat, items);
    }

    #[test]
    fn prop_pattern_fits_or_overflows(n in 1usize..20, pattern in arb_pattern()) {
        let items: Vec<usize> = (0..n).collect();
        let capacity: usize = pattern.iter().sum();
        match pack_pattern(items.clone(), &pattern) {
            Ok(rows) => {
                prop_assert!(capacity >= n);
                prop_assert!(rows.len() <= pattern.len());
                for (row, &limit) in rows.iter().zip(pattern.iter()) {
                    prop_assert!(!row.is_empty() && row.len() <= limit);
                }
                let flat: Vec<usize> = rows.into_iter().flatten().collect();
                prop_assert_eq!(flat, items);
            }
            Err(LayoutError::Overflow { buttons, .. }) => {
                prop_assert!(capacity < n);
                prop_assert_eq!(buttons, n);
            }
            Err(e) => prop_assert!(false, "unexpected error: {}", e),
        }
    }

    #[test]
    fn prop_pattern_rejects_zero_rows(
        n in 1usize..10,
        mut pattern in arb_pattern(),
        at in 0usize..6,
    ) {
        let at = at % pattern.len();
        pattern[at] = 0;
        let items: Vec<usize> = (0..n).collect();
        prop_assert_eq!(pack_pattern(items, &pattern), Err(LayoutError::EmptyRow { row: at }));
    }
}
