//! Property tests for the distribution invariants.

use proptest::prelude::*;
use qbank_core::distribution::{even_counts, matrix_counts, weighted_counts};
use qbank_core::render::render_lesson;

proptest! {
    #[test]
    fn even_counts_always_sum_to_total(total in 0u32..500, buckets in 1usize..12) {
        let counts = even_counts(total, buckets);
        prop_assert_eq!(counts.len(), buckets);
        prop_assert_eq!(counts.iter().sum::<u32>(), total);
        // Counts never differ by more than one unit.
        let max = counts.iter().max().unwrap();
        let min = counts.iter().min().unwrap();
        prop_assert!(max - min <= 1);
    }

    #[test]
    fn weighted_counts_always_sum_to_total(
        total in 0u32..500,
        weights in proptest::collection::vec(0.0f64..100.0, 1..10),
    ) {
        let counts = weighted_counts(total, &weights).unwrap();
        prop_assert_eq!(counts.len(), weights.len());
        prop_assert_eq!(counts.iter().sum::<u32>(), total);
    }

    #[test]
    fn matrix_counts_always_sum_to_total(
        total in 0u32..500,
        rows in proptest::collection::vec(0.0f64..100.0, 1..8),
        cols in proptest::collection::vec(0.0f64..100.0, 1..4),
    ) {
        let rows: Vec<(String, f64)> = rows
            .into_iter()
            .enumerate()
            .map(|(i, p)| (format!("{}", i + 1), p))
            .collect();
        let cols: Vec<(String, f64)> = cols
            .into_iter()
            .enumerate()
            .map(|(i, p)| (format!("d{i}"), p))
            .collect();
        let matrix = matrix_counts(total, &rows, &cols).unwrap();
        prop_assert_eq!(matrix.grand_total, total);
        prop_assert_eq!(matrix.row_totals.iter().sum::<u32>(), total);
        prop_assert_eq!(matrix.col_totals.iter().sum::<u32>(), total);
        let cell_sum: u32 = matrix.cells.iter().flatten().sum();
        prop_assert_eq!(cell_sum, total);
    }

    #[test]
    fn renderer_never_panics(content in "\\PC{0,400}") {
        // Worst case is imperfect markup, never a crash.
        let _ = render_lesson(&content, &["Chapter One".to_string()]);
    }
}
