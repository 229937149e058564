//! Question-count distribution across Bloom's levels and difficulty bands.
//!
//! Every function here upholds two hard invariants: output counts are never
//! negative, and they sum exactly to the requested total. Rounding drift is
//! reconciled at the single largest-weight bucket (ties broken by first
//! occurrence); when a subtraction would drive that bucket below zero it is
//! floored at zero and the remainder carries to the next-largest bucket.

use crate::model::ExamFormat;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Errors from distribution arithmetic
#[derive(Debug, Clone, PartialEq)]
pub enum DistributionError {
    /// A percentage was negative, NaN or infinite
    InvalidPercent { value: f64 },
    /// No buckets were supplied
    EmptyWeights,
}

impl fmt::Display for DistributionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistributionError::InvalidPercent { value } => {
                write!(f, "Invalid percentage {value}: must be a finite value >= 0")
            }
            DistributionError::EmptyWeights => write!(f, "No distribution buckets supplied"),
        }
    }
}

impl std::error::Error for DistributionError {}

/// Split `total` as evenly as possible over `buckets` buckets.
///
/// The remainder (`total % buckets`) is assigned one unit each to the first
/// `remainder` buckets in iteration order, so `even_counts(17, 5)` yields
/// `[4, 4, 3, 3, 3]`.
pub fn even_counts(total: u32, buckets: usize) -> Vec<u32> {
    if buckets == 0 {
        return Vec::new();
    }
    let base = total / buckets as u32;
    let remainder = (total % buckets as u32) as usize;
    (0..buckets)
        .map(|i| base + u32::from(i < remainder))
        .collect()
}

/// Scale percentages so they sum to 100.
///
/// Percentages are taken from user input or AI responses and are not trusted
/// to sum to anything in particular. An all-zero weighting is not an error:
/// it degenerates to even weights.
pub fn normalize(weights: &[f64]) -> Result<Vec<f64>, DistributionError> {
    if weights.is_empty() {
        return Err(DistributionError::EmptyWeights);
    }
    for &w in weights {
        if !w.is_finite() || w < 0.0 {
            return Err(DistributionError::InvalidPercent { value: w });
        }
    }
    let sum: f64 = weights.iter().sum();
    if sum == 0.0 {
        let even = 100.0 / weights.len() as f64;
        return Ok(vec![even; weights.len()]);
    }
    Ok(weights.iter().map(|w| w * 100.0 / sum).collect())
}

/// Split `total` according to percentage `weights`.
///
/// Each bucket gets `round(total * percent / 100)`; any discrepancy between
/// the rounded sum and `total` is applied at the largest-weight bucket.
pub fn weighted_counts(total: u32, weights: &[f64]) -> Result<Vec<u32>, DistributionError> {
    if weights.is_empty() {
        return Err(DistributionError::EmptyWeights);
    }
    for &w in weights {
        if !w.is_finite() || w < 0.0 {
            return Err(DistributionError::InvalidPercent { value: w });
        }
    }
    if weights.iter().all(|&w| w == 0.0) {
        return Ok(even_counts(total, weights.len()));
    }
    let mut counts: Vec<i64> = weights
        .iter()
        .map(|&w| (f64::from(total) * w / 100.0).round() as i64)
        .collect();
    reconcile(&mut counts, weights, total);
    Ok(counts.into_iter().map(|c| c as u32).collect())
}

/// Apply the rounding discrepancy so the counts sum exactly to `total`.
///
/// Buckets are ranked by weight descending, first occurrence winning ties.
/// Additions land entirely on the top bucket; subtractions floor each bucket
/// at zero and carry the rest down the ranking.
fn reconcile(counts: &mut [i64], weights: &[f64], total: u32) {
    let mut diff = i64::from(total) - counts.iter().sum::<i64>();
    if diff == 0 {
        return;
    }
    let mut order: Vec<usize> = (0..counts.len()).collect();
    order.sort_by(|&a, &b| {
        weights[b]
            .partial_cmp(&weights[a])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });
    if diff > 0 {
        counts[order[0]] += diff;
        return;
    }
    for &i in &order {
        if diff == 0 {
            break;
        }
        let take = (-diff).min(counts[i]);
        counts[i] -= take;
        diff += take;
    }
}

/// A two-dimensional (Bloom's level × difficulty) count breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    pub row_keys: Vec<String>,
    pub col_keys: Vec<String>,
    /// `cells[row][col]`
    pub cells: Vec<Vec<u32>>,
    pub row_totals: Vec<u32>,
    pub col_totals: Vec<u32>,
    pub grand_total: u32,
}

/// Cross-tabulate `total` over two independently-normalized dimensions.
///
/// Each cell gets `round(total * row_pct/100 * col_pct/100)` and the grand
/// total is reconciled at the largest-weight cell; the reported row and
/// column subtotals are the sums of the final cells.
pub fn matrix_counts(
    total: u32,
    rows: &[(String, f64)],
    cols: &[(String, f64)],
) -> Result<Matrix, DistributionError> {
    let row_pcts = normalize(&rows.iter().map(|(_, p)| *p).collect::<Vec<_>>())?;
    let col_pcts = normalize(&cols.iter().map(|(_, p)| *p).collect::<Vec<_>>())?;

    let mut weights = Vec::with_capacity(rows.len() * cols.len());
    let mut counts: Vec<i64> = Vec::with_capacity(rows.len() * cols.len());
    for rp in &row_pcts {
        for cp in &col_pcts {
            let share = rp / 100.0 * cp / 100.0;
            weights.push(share);
            counts.push((f64::from(total) * share).round() as i64);
        }
    }
    reconcile(&mut counts, &weights, total);

    let cells: Vec<Vec<u32>> = counts
        .chunks(cols.len())
        .map(|chunk| chunk.iter().map(|&c| c as u32).collect())
        .collect();
    let row_totals: Vec<u32> = cells.iter().map(|row| row.iter().sum()).collect();
    let col_totals: Vec<u32> = (0..cols.len())
        .map(|c| cells.iter().map(|row| row[c]).sum())
        .collect();

    Ok(Matrix {
        row_keys: rows.iter().map(|(k, _)| k.clone()).collect(),
        col_keys: cols.iter().map(|(k, _)| k.clone()).collect(),
        cells,
        row_totals,
        col_totals,
        grand_total: total,
    })
}

/// The integer plan derived from a requested count and optional weighting.
///
/// Invariant: `buckets` values sum to `total`.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionSpec {
    pub total: u32,
    pub buckets: Vec<(String, u32)>,
}

impl DistributionSpec {
    /// Even split over the given bucket keys, in key order.
    pub fn even(total: u32, keys: &[String]) -> DistributionSpec {
        let counts = even_counts(total, keys.len());
        DistributionSpec {
            total,
            buckets: keys.iter().cloned().zip(counts).collect(),
        }
    }

    /// Weighted split; percentages are normalized defensively first.
    pub fn weighted(
        total: u32,
        weights: &[(String, f64)],
    ) -> Result<DistributionSpec, DistributionError> {
        let pcts = normalize(&weights.iter().map(|(_, p)| *p).collect::<Vec<_>>())?;
        let counts = weighted_counts(total, &pcts)?;
        Ok(DistributionSpec {
            total,
            buckets: weights
                .iter()
                .map(|(k, _)| k.clone())
                .zip(counts)
                .collect(),
        })
    }

    /// Bloom's level plan from an optional exam format.
    ///
    /// Without a format (or with an empty weighting) the default key set is
    /// levels 1..=5 split evenly, matching the backend's legacy behavior.
    pub fn blooms(
        total: u32,
        format: Option<&ExamFormat>,
    ) -> Result<DistributionSpec, DistributionError> {
        match format {
            Some(f) if !f.blooms_distribution.is_empty() => {
                let weights: Vec<(String, f64)> = f
                    .blooms_distribution
                    .iter()
                    .map(|(level, pct)| (level.to_string(), *pct))
                    .collect();
                DistributionSpec::weighted(total, &weights)
            }
            _ => {
                let keys: Vec<String> = (1..=5u8).map(|l| l.to_string()).collect();
                Ok(DistributionSpec::even(total, &keys))
            }
        }
    }

    /// Bloom's × difficulty plan from an exam format.
    pub fn blooms_by_difficulty(
        total: u32,
        format: &ExamFormat,
    ) -> Result<Matrix, DistributionError> {
        let rows: Vec<(String, f64)> = if format.blooms_distribution.is_empty() {
            (1..=5u8).map(|l| (l.to_string(), 0.0)).collect()
        } else {
            format
                .blooms_distribution
                .iter()
                .map(|(level, pct)| (level.to_string(), *pct))
                .collect()
        };
        let cols = match &format.difficulty_distribution {
            Some(map) => difficulty_weights(map),
            None => DIFFICULTY_ORDER
                .iter()
                .map(|d| (d.to_string(), 0.0))
                .collect(),
        };
        matrix_counts(total, &rows, &cols)
    }

    /// Sum of the bucket counts (always equals `total`).
    pub fn bucket_sum(&self) -> u32 {
        self.buckets.iter().map(|(_, c)| c).sum()
    }
}

const DIFFICULTY_ORDER: [&str; 3] = ["easy", "medium", "hard"];

/// Difficulty weights in canonical easy/medium/hard order, any other keys
/// trailing in map order.
fn difficulty_weights(map: &BTreeMap<String, f64>) -> Vec<(String, f64)> {
    let mut out: Vec<(String, f64)> = DIFFICULTY_ORDER
        .iter()
        .filter_map(|d| map.get(*d).map(|p| (d.to_string(), *p)))
        .collect();
    for (k, p) in map {
        if !DIFFICULTY_ORDER.contains(&k.as_str()) {
            out.push((k.clone(), *p));
        }
    }
    if out.is_empty() {
        out = DIFFICULTY_ORDER.iter().map(|d| (d.to_string(), 0.0)).collect();
    }
    out
}

/// Blend difficulty percentages into a single 0..=1 difficulty index.
///
/// Weighs easy at 0, medium at 0.5 and hard at 1. The original front end
/// computed the medium term as `easy || 0 + medium * 0.5`, which evaluates as
/// `easy || (medium * 0.5)` and silently drops the medium weight whenever an
/// easy percentage is present; that reading is ambiguous source behavior and
/// is not reproduced here.
pub fn difficulty_index(map: &BTreeMap<String, f64>) -> f64 {
    let get = |k: &str| map.get(k).copied().unwrap_or(0.0);
    let total: f64 = get("easy") + get("medium") + get("hard");
    if total == 0.0 {
        return 0.5;
    }
    (get("medium") * 0.5 + get("hard")) / total
}

/// Descriptive name for a Bloom's level on the extended 7-point scale.
pub fn blooms_level_name(level: u8) -> &'static str {
    match level {
        1 => "Remember",
        2 => "Understand",
        3 => "Apply",
        4 => "Analyze",
        5 => "Evaluate",
        6 => "Create",
        7 => "Integrate",
        _ => "",
    }
}

fn bucket_label(key: &str) -> String {
    match key.parse::<u8>() {
        Ok(level) if !blooms_level_name(level).is_empty() => {
            format!("{level} ({})", blooms_level_name(level))
        }
        _ => key.to_string(),
    }
}

impl fmt::Display for DistributionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<String> = self.buckets.iter().map(|(k, _)| bucket_label(k)).collect();
        let width = labels
            .iter()
            .map(|l| l.len())
            .max()
            .unwrap_or(0)
            .max("total".len());
        for (label, (_, count)) in labels.iter().zip(&self.buckets) {
            writeln!(f, "{label:<width$}  {count:>5}")?;
        }
        write!(f, "{:<width$}  {:>5}", "total", self.total)
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<String> = self.row_keys.iter().map(|k| bucket_label(k)).collect();
        let width = labels
            .iter()
            .map(|l| l.len())
            .max()
            .unwrap_or(0)
            .max("total".len());
        let col_width = self
            .col_keys
            .iter()
            .map(|k| k.len())
            .max()
            .unwrap_or(0)
            .max(5);

        write!(f, "{:<width$}", "")?;
        for key in &self.col_keys {
            write!(f, "  {key:>col_width$}")?;
        }
        writeln!(f, "  {:>col_width$}", "total")?;

        for (r, label) in labels.iter().enumerate() {
            write!(f, "{label:<width$}")?;
            for count in &self.cells[r] {
                write!(f, "  {count:>col_width$}")?;
            }
            writeln!(f, "  {:>col_width$}", self.row_totals[r])?;
        }

        write!(f, "{:<width$}", "total")?;
        for count in &self.col_totals {
            write!(f, "  {count:>col_width$}")?;
        }
        write!(f, "  {:>col_width$}", self.grand_total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn even_split_assigns_remainder_to_leading_buckets() {
        assert_eq!(even_counts(17, 5), vec![4, 4, 3, 3, 3]);
        assert_eq!(even_counts(10, 5), vec![2, 2, 2, 2, 2]);
        assert_eq!(even_counts(0, 3), vec![0, 0, 0]);
        assert_eq!(even_counts(2, 5), vec![1, 1, 0, 0, 0]);
    }

    #[test]
    fn even_split_with_no_buckets_is_empty() {
        assert!(even_counts(10, 0).is_empty());
    }

    #[test]
    fn weighted_drift_lands_on_single_largest_bucket() {
        // Raw counts round to 3+3+3 = 9; the missing unit goes to the 34%
        // bucket only.
        let counts = weighted_counts(10, &[33.0, 33.0, 34.0]).unwrap();
        assert_eq!(counts, vec![3, 3, 4]);
    }

    #[test]
    fn weighted_tie_breaks_by_first_occurrence() {
        // 25% of 10 rounds to 3 each (2.5 rounds up), so two units must come
        // back out; the floor-and-carry order starts at the first bucket.
        let counts = weighted_counts(10, &[25.0, 25.0, 25.0, 25.0]).unwrap();
        assert_eq!(counts.iter().sum::<u32>(), 10);
        assert_eq!(counts, vec![1, 3, 3, 3]);
    }

    #[test]
    fn weighted_all_zero_degenerates_to_even() {
        let counts = weighted_counts(17, &[0.0, 0.0, 0.0, 0.0, 0.0]).unwrap();
        assert_eq!(counts, vec![4, 4, 3, 3, 3]);
    }

    #[test]
    fn weighted_rejects_invalid_percentages() {
        assert!(matches!(
            weighted_counts(10, &[-1.0, 50.0]),
            Err(DistributionError::InvalidPercent { .. })
        ));
        assert!(matches!(
            weighted_counts(10, &[f64::NAN]),
            Err(DistributionError::InvalidPercent { .. })
        ));
        assert!(matches!(
            weighted_counts(10, &[]),
            Err(DistributionError::EmptyWeights)
        ));
    }

    #[test]
    fn normalize_scales_to_hundred() {
        let pcts = normalize(&[1.0, 1.0]).unwrap();
        assert_eq!(pcts, vec![50.0, 50.0]);
        let pcts = normalize(&[0.0, 0.0, 0.0, 0.0]).unwrap();
        assert_eq!(pcts, vec![25.0, 25.0, 25.0, 25.0]);
    }

    fn keyed(pairs: &[(&str, f64)]) -> Vec<(String, f64)> {
        pairs.iter().map(|(k, p)| (k.to_string(), *p)).collect()
    }

    #[test]
    fn matrix_marginals_match_normalized_percentages() {
        // Exact arithmetic: every cell share of 100 is an integer.
        let rows = keyed(&[("1", 20.0), ("2", 20.0), ("3", 20.0), ("4", 20.0), ("5", 20.0)]);
        let cols = keyed(&[("easy", 30.0), ("medium", 40.0), ("hard", 30.0)]);
        let m = matrix_counts(100, &rows, &cols).unwrap();
        assert_eq!(m.row_totals, vec![20, 20, 20, 20, 20]);
        assert_eq!(m.col_totals, vec![30, 40, 30]);
        assert_eq!(m.grand_total, 100);
        assert_eq!(m.cells[0], vec![6, 8, 6]);
    }

    #[test]
    fn matrix_grand_total_survives_heavy_rounding() {
        // 15 cells each rounding 0.667 up would sum to 15; the clamp walks
        // the surplus back without going negative.
        let rows = keyed(&[("1", 20.0), ("2", 20.0), ("3", 20.0), ("4", 20.0), ("5", 20.0)]);
        let cols = keyed(&[("easy", 0.0), ("medium", 0.0), ("hard", 0.0)]);
        let m = matrix_counts(10, &rows, &cols).unwrap();
        let cell_sum: u32 = m.cells.iter().flatten().sum();
        assert_eq!(cell_sum, 10);
        assert_eq!(m.row_totals.iter().sum::<u32>(), 10);
        assert_eq!(m.col_totals.iter().sum::<u32>(), 10);
    }

    #[test]
    fn spec_even_matches_legacy_backend_split() {
        let keys: Vec<String> = (1..=5u8).map(|l| l.to_string()).collect();
        let spec = DistributionSpec::even(17, &keys);
        let counts: Vec<u32> = spec.buckets.iter().map(|(_, c)| *c).collect();
        assert_eq!(counts, vec![4, 4, 3, 3, 3]);
        assert_eq!(spec.bucket_sum(), 17);
    }

    #[test]
    fn spec_blooms_uses_format_weighting() {
        let mut format = ExamFormat::default();
        format.blooms_distribution =
            [(3u8, 50.0), (4u8, 30.0), (5u8, 20.0)].into_iter().collect();
        let spec = DistributionSpec::blooms(20, Some(&format)).unwrap();
        assert_eq!(
            spec.buckets,
            vec![
                ("3".to_string(), 10),
                ("4".to_string(), 6),
                ("5".to_string(), 4)
            ]
        );
    }

    #[test]
    fn spec_blooms_defaults_to_five_even_levels() {
        let spec = DistributionSpec::blooms(17, None).unwrap();
        assert_eq!(spec.buckets.len(), 5);
        assert_eq!(spec.bucket_sum(), 17);
        assert_eq!(spec.buckets[0], ("1".to_string(), 4));
    }

    #[test]
    fn difficulty_weights_use_canonical_order() {
        let map: BTreeMap<String, f64> = [
            ("hard".to_string(), 20.0),
            ("easy".to_string(), 50.0),
            ("medium".to_string(), 30.0),
        ]
        .into_iter()
        .collect();
        let weights = difficulty_weights(&map);
        let keys: Vec<&str> = weights.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["easy", "medium", "hard"]);
    }

    #[test]
    fn difficulty_index_weighs_medium_at_half() {
        let map: BTreeMap<String, f64> = [
            ("easy".to_string(), 50.0),
            ("medium".to_string(), 50.0),
        ]
        .into_iter()
        .collect();
        assert!((difficulty_index(&map) - 0.25).abs() < 1e-9);
        assert_eq!(difficulty_index(&BTreeMap::new()), 0.5);
    }

    #[test]
    fn display_lists_buckets_and_total() {
        let spec = DistributionSpec::blooms(17, None).unwrap();
        let text = spec.to_string();
        assert!(text.contains("1 (Remember)"));
        assert!(text.contains("5 (Evaluate)"));
        assert!(text.lines().last().unwrap().contains("17"));
    }

    #[test]
    fn matrix_display_includes_marginals() {
        let rows = keyed(&[("1", 50.0), ("2", 50.0)]);
        let cols = keyed(&[("easy", 50.0), ("hard", 50.0)]);
        let m = matrix_counts(8, &rows, &cols).unwrap();
        let text = m.to_string();
        assert!(text.contains("easy"));
        assert!(text.contains("total"));
        assert!(text.lines().last().unwrap().contains('8'));
    }
}
