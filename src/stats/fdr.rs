//! Benjamini-Hochberg false discovery rate correction

use std::cmp::Ordering;

/// Benjamini-Hochberg adjusted p-values (step-up, monotone).
///
/// `None` (or non-finite) inputs are indeterminate: they keep a `None`
/// adjustment and are excluded from the family size `m`. Adjusted values are
/// clipped to 1 and never fall below their raw p-value.
///
/// # Example
///
/// ```rust
/// use tiered_eval::stats::benjamini_hochberg;
///
/// let adjusted = benjamini_hochberg(&[Some(0.01), None, Some(0.04), Some(0.03)]);
/// assert_eq!(adjusted[1], None);
/// assert!((adjusted[0].unwrap() - 0.03).abs() < 1e-12);
/// assert!((adjusted[2].unwrap() - 0.04).abs() < 1e-12);
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn benjamini_hochberg(pvalues: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut adjusted = vec![None; pvalues.len()];

    let mut order: Vec<(usize, f64)> = pvalues
        .iter()
        .enumerate()
        .filter_map(|(i, p)| p.filter(|p| p.is_finite()).map(|p| (i, p)))
        .collect();
    if order.is_empty() {
        return adjusted;
    }
    order.sort_by(|(i, p), (j, q)| p.partial_cmp(q).unwrap_or(Ordering::Equal).then(i.cmp(j)));

    let m = order.len() as f64;
    let mut running_min = 1.0_f64;
    for (rank0, &(idx, p)) in order.iter().enumerate().rev() {
        let rank = (rank0 + 1) as f64;
        running_min = running_min.min((p * m / rank).min(1.0));
        adjusted[idx] = Some(running_min);
    }
    adjusted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_all_null() {
        assert!(benjamini_hochberg(&[]).is_empty());
        assert_eq!(benjamini_hochberg(&[None, None]), vec![None, None]);
    }

    #[test]
    fn test_single_pvalue_unchanged() {
        assert_eq!(benjamini_hochberg(&[Some(0.02)]), vec![Some(0.02)]);
    }

    #[test]
    fn test_known_adjustment() {
        // m = 4: 0.01*4/1=0.04, 0.02*4/2=0.04, 0.03*4/3=0.04, 0.5*4/4=0.5
        let adjusted = benjamini_hochberg(&[Some(0.5), Some(0.03), Some(0.01), Some(0.02)]);
        let expected = [0.5, 0.04, 0.04, 0.04];
        for (adj, exp) in adjusted.iter().zip(expected) {
            assert!((adj.unwrap() - exp).abs() < 1e-12);
        }
    }

    #[test]
    fn test_nulls_excluded_from_family_size() {
        let with_null = benjamini_hochberg(&[Some(0.02), None, Some(0.04)]);
        let without = benjamini_hochberg(&[Some(0.02), Some(0.04)]);
        assert_eq!(with_null[0], without[0]);
        assert_eq!(with_null[2], without[1]);
        assert_eq!(with_null[1], None);
    }

    #[test]
    fn test_clipped_to_one() {
        let adjusted = benjamini_hochberg(&[Some(0.9), Some(0.95), Some(0.99)]);
        assert!(adjusted.iter().all(|p| p.unwrap() <= 1.0));
    }

    #[test]
    fn test_nan_treated_as_indeterminate() {
        let adjusted = benjamini_hochberg(&[Some(f64::NAN), Some(0.01)]);
        assert_eq!(adjusted, vec![None, Some(0.01)]);
    }
}
