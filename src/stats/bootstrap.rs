//! Percentile bootstrap confidence intervals
//!
//! Resampling uses a fixed-seed `Xoshiro256PlusPlus` stream so identical input
//! always yields a bit-identical interval, regardless of how many groups are
//! summarized or in which thread.

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use super::{mean, median, quantile_sorted};
use crate::config::BootstrapConfig;

/// Statistic evaluated on each bootstrap resample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Statistic {
    /// Arithmetic mean
    #[default]
    Mean,
    /// Median
    Median,
}

impl Statistic {
    /// Evaluate the statistic.
    #[must_use]
    pub fn compute(self, values: &[f64]) -> f64 {
        match self {
            Self::Mean => mean(values),
            Self::Median => median(values),
        }
    }
}

/// Bootstrap confidence interval `(low, high)` for `config.statistic`.
///
/// Bounds are the `alpha/2` and `1 - alpha/2` empirical quantiles of the
/// resampled statistic, with `alpha = 1 - config.ci`.
///
/// - empty input: `(0.0, 0.0)`
/// - single value `v`: `(v, v)` without resampling
///
/// # Example
///
/// ```rust
/// use tiered_eval::config::BootstrapConfig;
/// use tiered_eval::stats::bootstrap_ci;
///
/// let values = [0.2, 0.3, 0.25, 0.2, 0.3];
/// let (low, high) = bootstrap_ci(&values, &BootstrapConfig::default());
/// assert!(low <= 0.25 && 0.25 <= high);
/// assert_eq!((low, high), bootstrap_ci(&values, &BootstrapConfig::default()));
/// ```
#[must_use]
pub fn bootstrap_ci(values: &[f64], config: &BootstrapConfig) -> (f64, f64) {
    match values.len() {
        0 => return (0.0, 0.0),
        1 => return (values[0], values[0]),
        _ => {}
    }
    if config.n_samples == 0 {
        let point = config.statistic.compute(values);
        return (point, point);
    }

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(config.seed);
    let n = values.len();
    let mut resample = vec![0.0; n];
    let mut stats: Vec<f64> = Vec::with_capacity(config.n_samples);

    for _ in 0..config.n_samples {
        for slot in &mut resample {
            *slot = values[rng.gen_range(0..n)];
        }
        stats.push(config.statistic.compute(&resample));
    }

    stats.sort_by(f64::total_cmp);
    let tail = (1.0 - config.ci) / 2.0;
    (quantile_sorted(&stats, tail), quantile_sorted(&stats, 1.0 - tail))
}
