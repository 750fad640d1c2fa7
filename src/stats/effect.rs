//! Effect size estimators
//!
//! Sign convention: positive means the first sample exceeds the second.

use super::{mean, sample_variance, sorted};

/// Cohen's d with pooled sample variance.
///
/// Returns `0.0` when either sample has fewer than two observations or the
/// pooled variance is not positive.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn cohens_d(a: &[f64], b: &[f64]) -> f64 {
    if a.len() < 2 || b.len() < 2 {
        return 0.0;
    }
    let (na, nb) = (a.len() as f64, b.len() as f64);
    let pooled =
        ((na - 1.0) * sample_variance(a) + (nb - 1.0) * sample_variance(b)) / (na + nb - 2.0);
    if pooled.is_nan() || pooled <= 0.0 {
        return 0.0;
    }
    (mean(a) - mean(b)) / pooled.sqrt()
}

/// Cliff's delta: `(wins - losses) / (|a| * |b|)`.
///
/// A win is a pair where the `a` element is strictly greater; ties count for
/// neither side. Returns `0.0` if either sample is empty.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn cliffs_delta(a: &[f64], b: &[f64]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let sorted_b = sorted(b);
    let mut wins = 0usize;
    let mut losses = 0usize;
    for &value in a {
        // left insertion point: elements strictly below
        wins += sorted_b.partition_point(|&x| x < value);
        // right insertion point: elements at or below
        losses += sorted_b.len() - sorted_b.partition_point(|&x| x <= value);
    }
    (wins as f64 - losses as f64) / (a.len() * b.len()) as f64
}
