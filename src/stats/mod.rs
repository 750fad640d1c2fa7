//! Statistics for experiment comparisons
//!
//! Exactly the estimators and tests the comparison protocol needs:
//!
//! - Descriptive: [`mean`], [`median`], [`std`], [`bootstrap_ci`]
//! - Effect sizes: [`cohens_d`], [`cliffs_delta`]
//! - Tests: [`HypothesisTests`] (Mann-Whitney U, two-sample Kolmogorov-Smirnov)
//! - Multiple comparisons: [`benjamini_hochberg`]
//! - Power: [`required_n_per_group`]
//!
//! Empty inputs follow a zero-value policy for descriptive statistics and an
//! indeterminate (`None`) policy for tests.
//!
//! References:
//! - Efron & Tibshirani (1993): An Introduction to the Bootstrap
//! - Benjamini & Hochberg (1995): Controlling the False Discovery Rate

mod bootstrap;
mod effect;
mod fdr;
mod hypothesis;
mod power;

pub use bootstrap::{bootstrap_ci, Statistic};
pub use effect::{cliffs_delta, cohens_d};
pub use fdr::benjamini_hochberg;
pub use hypothesis::{HypothesisTests, NonparametricTests, TestResult, UnavailableTests};
pub use power::required_n_per_group;

/// Arithmetic mean; `0.0` for an empty slice.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median (average of the middle pair for even lengths); `0.0` when empty.
#[must_use]
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    quantile_sorted(&sorted(values), 0.5)
}

/// Sample standard deviation (divisor n-1); `0.0` for fewer than two values.
#[must_use]
pub fn std(values: &[f64]) -> f64 {
    sample_variance(values).sqrt()
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    ss / (values.len() - 1) as f64
}

/// Copy and sort ascending (total order, NaN last).
pub(crate) fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(f64::total_cmp);
    out
}

/// Quantile of pre-sorted data with linear interpolation between order statistics.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub(crate) fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let h = (n - 1) as f64 * q.clamp(0.0, 1.0);
            let lo = h.floor() as usize;
            let hi = (lo + 1).min(n - 1);
            let frac = h - lo as f64;
            sorted[lo] + frac * (sorted[hi] - sorted[lo])
        }
    }
}
