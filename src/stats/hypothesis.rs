//! Two-sample nonparametric hypothesis tests
//!
//! Tests are reached through the [`HypothesisTests`] capability so that a
//! deployment without a trusted test implementation can plug in
//! [`UnavailableTests`] and still produce a report: every p-value is then
//! `None`, which downstream code reads as "no conclusion". The same holds
//! for samples that are empty or contain a non-finite value.
//!
//! References:
//! - Mann & Whitney (1947): On a test of whether one of two random variables
//!   is stochastically larger than the other
//! - Hodges (1957): The significance probability of the Smirnov two-sample test

use serde::{Deserialize, Serialize};
use statrs::function::erf::erfc;
use std::f64::consts::SQRT_2;

use super::sorted;

/// Largest `min(n1, n2)` for which the exact Mann-Whitney distribution is used.
const MWU_EXACT_MAX_N: usize = 8;

/// Largest `max(n1, n2)` for which the exact Smirnov distribution is used.
const KS_EXACT_MAX_N: usize = 10_000;

/// Outcome of a hypothesis test; both fields are `None` when indeterminate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TestResult {
    /// Test statistic
    pub statistic: Option<f64>,
    /// Two-sided p-value
    pub p_value: Option<f64>,
}

impl TestResult {
    /// The indeterminate result.
    pub const INDETERMINATE: Self = Self {
        statistic: None,
        p_value: None,
    };

    const fn new(statistic: f64, p_value: f64) -> Self {
        Self {
            statistic: Some(statistic),
            p_value: Some(p_value),
        }
    }

    /// Whether the test reached a conclusion.
    #[must_use]
    pub const fn is_determinate(&self) -> bool {
        self.p_value.is_some()
    }
}

/// Capability for the two-sample tests used by the comparator.
pub trait HypothesisTests: Send + Sync {
    /// Two-sided Mann-Whitney U test. The statistic is U for sample `a`.
    fn mann_whitney_u(&self, a: &[f64], b: &[f64]) -> TestResult;

    /// Two-sided two-sample Kolmogorov-Smirnov test. The statistic is D.
    fn ks_test(&self, a: &[f64], b: &[f64]) -> TestResult;
}

/// Full implementation of the nonparametric tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonparametricTests;

/// Null implementation: every test is indeterminate.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableTests;

impl HypothesisTests for UnavailableTests {
    fn mann_whitney_u(&self, _a: &[f64], _b: &[f64]) -> TestResult {
        TestResult::INDETERMINATE
    }

    fn ks_test(&self, _a: &[f64], _b: &[f64]) -> TestResult {
        TestResult::INDETERMINATE
    }
}

impl HypothesisTests for NonparametricTests {
    #[allow(clippy::cast_precision_loss)]
    fn mann_whitney_u(&self, a: &[f64], b: &[f64]) -> TestResult {
        if !testable(a) || !testable(b) {
            return TestResult::INDETERMINATE;
        }
        let (n1, n2) = (a.len(), b.len());
        let ranking = rank_with_ties(a, b);

        let u1 = ranking.rank_sum_a - (n1 * (n1 + 1)) as f64 / 2.0;
        let u2 = (n1 * n2) as f64 - u1;
        let u_big = u1.max(u2);

        let p = if ranking.tie_term == 0.0 && n1.min(n2) <= MWU_EXACT_MAX_N {
            mwu_exact_sf(n1, n2, u_big)
        } else {
            mwu_asymptotic_sf(n1, n2, u_big, ranking.tie_term)
        };
        TestResult::new(u1, (2.0 * p).min(1.0))
    }

    #[allow(clippy::cast_precision_loss)]
    fn ks_test(&self, a: &[f64], b: &[f64]) -> TestResult {
        if !testable(a) || !testable(b) {
            return TestResult::INDETERMINATE;
        }
        let (n1, n2) = (a.len(), b.len());
        let gap = max_ecdf_gap(&sorted(a), &sorted(b));
        let d = gap as f64 / (n1 * n2) as f64;

        let p = if n1.max(n2) <= KS_EXACT_MAX_N {
            smirnov_exact_sf(n1, n2, gap)
        } else {
            let en = ((n1 * n2) as f64 / (n1 + n2) as f64).sqrt();
            kolmogorov_sf(d * en)
        };
        TestResult::new(d, p.clamp(0.0, 1.0))
    }
}

/// Non-empty and free of NaN/infinity.
fn testable(sample: &[f64]) -> bool {
    !sample.is_empty() && sample.iter().all(|v| v.is_finite())
}

/// Upper tail of the standard normal.
fn normal_sf(z: f64) -> f64 {
    0.5 * erfc(z / SQRT_2)
}

struct Ranking {
    rank_sum_a: f64,
    /// Sum over tie blocks of `t^3 - t`
    tie_term: f64,
}

/// Midranks of the pooled sample.
#[allow(clippy::cast_precision_loss)]
fn rank_with_ties(a: &[f64], b: &[f64]) -> Ranking {
    let mut pooled: Vec<(f64, bool)> = a
        .iter()
        .map(|&v| (v, true))
        .chain(b.iter().map(|&v| (v, false)))
        .collect();
    pooled.sort_by(|x, y| x.0.total_cmp(&y.0));

    let mut rank_sum_a = 0.0;
    let mut tie_term = 0.0;
    let mut start = 0;
    while start < pooled.len() {
        let mut end = start + 1;
        while end < pooled.len() && pooled[end].0 == pooled[start].0 {
            end += 1;
        }
        // ranks start..end (0-based) share the average 1-based rank
        let midrank = (start + end + 1) as f64 / 2.0;
        let in_a = pooled[start..end].iter().filter(|(_, from_a)| *from_a).count();
        rank_sum_a += midrank * in_a as f64;
        let t = (end - start) as f64;
        tie_term += t * t * t - t;
        start = end;
    }
    Ranking {
        rank_sum_a,
        tie_term,
    }
}

/// `P(U >= u)` under the exact null distribution (no ties).
///
/// The counts of U are the coefficients of the Gaussian binomial
/// `[n1 + n2 choose m]_q`, built as `prod (1 - q^(n+i)) / (1 - q^i)`.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn mwu_exact_sf(n1: usize, n2: usize, u: f64) -> f64 {
    let (m, n) = if n1 <= n2 { (n1, n2) } else { (n2, n1) };
    let mut coeffs = vec![0.0_f64; m * n + m + 1];
    coeffs[0] = 1.0;

    for i in 1..=m {
        let up = n + i;
        for j in (up..coeffs.len()).rev() {
            coeffs[j] -= coeffs[j - up];
        }
        for j in i..coeffs.len() {
            coeffs[j] += coeffs[j - i];
        }
    }

    let max_u = m * n;
    let total: f64 = coeffs[..=max_u].iter().sum();
    let from = (u.ceil().max(0.0) as usize).min(max_u + 1);
    let tail: f64 = coeffs[from..=max_u].iter().sum();
    tail / total
}

/// `P(U >= u)` by normal approximation with tie and continuity correction.
#[allow(clippy::cast_precision_loss)]
fn mwu_asymptotic_sf(n1: usize, n2: usize, u: f64, tie_term: f64) -> f64 {
    let (f1, f2) = (n1 as f64, n2 as f64);
    let n = f1 + f2;
    let mu = f1 * f2 / 2.0;
    let variance = f1 * f2 / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)));
    if variance <= 0.0 {
        // every observation identical
        return 1.0;
    }
    normal_sf((u - mu - 0.5) / variance.sqrt())
}

/// `max |c1 * n2 - c2 * n1|` over the pooled support; `D = gap / (n1 * n2)`.
///
/// Inputs must be sorted by `f64::total_cmp`. Comparisons use the same
/// total order, so every pass consumes at least one element.
fn max_ecdf_gap(a: &[f64], b: &[f64]) -> usize {
    let (n1, n2) = (a.len(), b.len());
    let (mut i, mut j) = (0, 0);
    let mut gap = 0;
    while i < n1 && j < n2 {
        let x = if a[i].total_cmp(&b[j]).is_le() { a[i] } else { b[j] };
        while i < n1 && a[i].total_cmp(&x).is_le() {
            i += 1;
        }
        while j < n2 && b[j].total_cmp(&x).is_le() {
            j += 1;
        }
        gap = gap.max((i * n2).abs_diff(j * n1));
    }
    gap
}

/// `P(D >= gap / (n1 n2))`: the probability that a uniformly random
/// monotone lattice path from `(0, 0)` to `(n1, n2)` touches the band edge
/// `|i n2 - j n1| >= gap`.
///
/// `mass[j]` is the probability of reaching `(i, j)` without touching the
/// edge; mass flowing into an edge cell is absorbed and summed. Summing the
/// absorbed mass keeps tiny p-values exact instead of computing `1 - p_inside`.
#[allow(clippy::cast_precision_loss)]
fn smirnov_exact_sf(n1: usize, n2: usize, gap: usize) -> f64 {
    if gap == 0 {
        return 1.0;
    }
    let outside = |i: usize, j: usize| (i * n2).abs_diff(j * n1) >= gap;
    // probability of the next step taking an `a` (resp. `b`) element from (i, j)
    let step_a = |i: usize, j: usize| (n1 - i) as f64 / (n1 - i + n2 - j) as f64;
    let step_b = |i: usize, j: usize| (n2 - j) as f64 / (n1 - i + n2 - j) as f64;

    let mut mass = vec![0.0_f64; n2 + 1];
    let mut absorbed = 0.0_f64;
    for i in 0..=n1 {
        for j in 0..=n2 {
            let incoming = if i == 0 && j == 0 {
                1.0
            } else {
                let from_above = if i > 0 { mass[j] * step_a(i - 1, j) } else { 0.0 };
                let from_left = if j > 0 { mass[j - 1] * step_b(i, j - 1) } else { 0.0 };
                from_above + from_left
            };
            if outside(i, j) {
                absorbed += incoming;
                mass[j] = 0.0;
            } else {
                mass[j] = incoming;
            }
        }
    }
    absorbed.min(1.0)
}

/// Survival function of the Kolmogorov distribution.
#[allow(clippy::cast_precision_loss)]
fn kolmogorov_sf(z: f64) -> f64 {
    if z <= 0.0 {
        return 1.0;
    }
    let mut p = 0.0;
    for k in 1_i32..=100 {
        let term = (-2.0 * f64::from(k).powi(2) * z * z).exp();
        if k % 2 == 1 {
            p += term;
        } else {
            p -= term;
        }
        if term < 1e-12 {
            break;
        }
    }
    (2.0 * p).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() < tol,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_empty_samples_indeterminate() {
        let tests = NonparametricTests;
        assert_eq!(tests.mann_whitney_u(&[], &[1.0]), TestResult::INDETERMINATE);
        assert_eq!(tests.ks_test(&[1.0], &[]), TestResult::INDETERMINATE);
    }

    #[test]
    fn test_unavailable_always_indeterminate() {
        let tests = UnavailableTests;
        let r = tests.mann_whitney_u(&[1.0, 2.0], &[3.0, 4.0]);
        assert!(!r.is_determinate());
        assert!(r.statistic.is_none());
        assert!(!tests.ks_test(&[1.0, 2.0], &[3.0, 4.0]).is_determinate());
    }

    #[test]
    fn test_mwu_exact_complete_separation() {
        // n1 = n2 = 3, no ties: P(U >= 9) = 1/20, two-sided 0.1
        let r = NonparametricTests.mann_whitney_u(&[4.0, 5.0, 6.0], &[1.0, 2.0, 3.0]);
        assert_close(r.statistic.unwrap(), 9.0, 1e-12);
        assert_close(r.p_value.unwrap(), 0.1, 1e-12);
    }

    #[test]
    fn test_mwu_statistic_is_first_sample_u() {
        let r = NonparametricTests.mann_whitney_u(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]);
        assert_close(r.statistic.unwrap(), 0.0, 1e-12);
        assert_close(r.p_value.unwrap(), 0.1, 1e-12);
    }

    #[test]
    fn test_mwu_exact_distribution_sums_to_one() {
        assert_close(mwu_exact_sf(4, 6, 0.0), 1.0, 1e-12);
        assert_close(mwu_exact_sf(8, 30, 0.0), 1.0, 1e-9);
    }

    #[test]
    fn test_mwu_asymptotic_with_ties() {
        // tie-corrected normal approximation:
        // sigma^2 = 25/12 * (11 - 24/90), z = (25 - 12.5 - 0.5) / sigma
        let r = NonparametricTests.mann_whitney_u(
            &[0.8, 0.9, 0.85, 0.8, 0.9],
            &[0.2, 0.3, 0.25, 0.2, 0.3],
        );
        let sigma = (25.0_f64 / 12.0 * (11.0 - 24.0 / 90.0)).sqrt();
        let expected = 2.0 * normal_sf(12.0 / sigma);
        assert_close(r.p_value.unwrap(), expected, 1e-12);
        assert!(r.p_value.unwrap() < 0.02);
    }

    #[test]
    fn test_mwu_identical_values() {
        let r = NonparametricTests.mann_whitney_u(&[1.0, 1.0], &[1.0, 1.0, 1.0]);
        assert_close(r.p_value.unwrap(), 1.0, 1e-12);
    }

    #[test]
    fn test_ks_identical_samples() {
        let sample = [1.0, 2.0, 3.0, 4.0];
        let r = NonparametricTests.ks_test(&sample, &sample);
        assert_close(r.statistic.unwrap(), 0.0, 1e-12);
        assert_close(r.p_value.unwrap(), 1.0, 1e-12);
    }

    #[test]
    fn test_ks_exact_complete_separation() {
        // Only the two extreme paths reach D = 1: p = 2 / C(6, 3) = 0.1
        let r = NonparametricTests.ks_test(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]);
        assert_close(r.statistic.unwrap(), 1.0, 1e-12);
        assert_close(r.p_value.unwrap(), 0.1, 1e-12);
    }

    #[test]
    fn test_ks_shifted_samples() {
        let a: Vec<f64> = (0_i32..200).map(f64::from).collect();
        let b: Vec<f64> = (100_i32..300).map(f64::from).collect();
        let r = NonparametricTests.ks_test(&a, &b);
        assert_close(r.statistic.unwrap(), 0.5, 1e-12);
        assert!(r.p_value.unwrap() < 1e-6);
    }

    #[test]
    fn test_ks_exact_used_up_to_ten_thousand_per_sample() {
        // exact: 2 / C(300, 150) ~ 1e-89; the asymptotic series gives ~1e-65
        let a: Vec<f64> = (0_i32..150).map(f64::from).collect();
        let b: Vec<f64> = (150_i32..300).map(f64::from).collect();
        let p = NonparametricTests.ks_test(&a, &b).p_value.unwrap();
        assert!(p > 0.0 && p < 1e-80, "p = {p}");
    }

    #[test]
    fn test_ks_exact_matches_hand_count() {
        // pooled order a a b a b b: D = 2/3. Only the 8 alternating-pair
        // paths of the 20 stay within |i - j| <= 1, so p = 12/20.
        let r = NonparametricTests.ks_test(&[1.0, 2.0, 4.0], &[3.0, 5.0, 6.0]);
        assert_close(r.statistic.unwrap(), 2.0 / 3.0, 1e-12);
        assert_close(r.p_value.unwrap(), 0.6, 1e-12);
    }

    #[test]
    fn test_non_finite_samples_indeterminate() {
        let tests = NonparametricTests;
        assert_eq!(tests.ks_test(&[1.0, f64::NAN], &[f64::NAN]), TestResult::INDETERMINATE);
        assert_eq!(
            tests.mann_whitney_u(&[1.0, 2.0], &[f64::INFINITY, 3.0]),
            TestResult::INDETERMINATE
        );
        assert_eq!(tests.ks_test(&[f64::NAN], &[2.0]), TestResult::INDETERMINATE);
    }

    #[test]
    fn test_ecdf_gap_terminates_on_nan() {
        assert_eq!(max_ecdf_gap(&[1.0, f64::NAN], &[f64::NAN]), 1);
        assert_eq!(max_ecdf_gap(&[f64::NAN], &[f64::NAN]), 0);
    }

    #[test]
    fn test_kolmogorov_sf_bounds() {
        assert_close(kolmogorov_sf(0.0), 1.0, 1e-12);
        assert!(kolmogorov_sf(3.0) < 1e-6);
    }
}
