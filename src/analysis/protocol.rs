//! Frequentist protocol annotation
//!
//! Two Benjamini-Hochberg families run side by side:
//!
//! - global: every comparison, feeding `p_mann_whitney_adj` / `significant`
//! - primary: primary-metric comparisons only, feeding
//!   `p_mann_whitney_primary_adj` / `primary_significant`
//!
//! They back two separate reporting claims and are never merged. A primary
//! comparison can be significant in one family and not the other.

use tracing::debug;

use super::report::{
    Comparison, ComparisonCounts, FrequentistProtocol, PowerRow, RunRecommendation,
};
use crate::config::ProtocolConfig;
use crate::stats::{benjamini_hochberg, required_n_per_group};

/// Basis statement attached to the run recommendation.
pub const RECOMMENDATION_BASIS: &str =
    "max required n across primary outcomes using two-sample power approximation";

fn adjust(pvalues: &[Option<f64>], apply_fdr: bool) -> Vec<Option<f64>> {
    if apply_fdr {
        benjamini_hochberg(pvalues)
    } else {
        pvalues.to_vec()
    }
}

fn is_significant(adjusted: Option<f64>, alpha: f64) -> bool {
    adjusted.is_some_and(|p| p <= alpha)
}

/// Fill the protocol fields of `comparisons` in place and build the
/// protocol section of the report.
pub fn annotate(comparisons: &mut [Comparison], config: &ProtocolConfig) -> FrequentistProtocol {
    for comp in comparisons.iter_mut() {
        comp.is_primary = config.is_primary(&comp.metric_name);
    }

    let raw: Vec<Option<f64>> = comparisons.iter().map(|c| c.p_mann_whitney).collect();
    for (comp, adj) in comparisons.iter_mut().zip(adjust(&raw, config.apply_fdr)) {
        comp.p_mann_whitney_adj = adj;
        comp.significant = is_significant(adj, config.alpha);
    }

    let primary_idx: Vec<usize> = comparisons
        .iter()
        .enumerate()
        .filter_map(|(idx, c)| c.is_primary.then_some(idx))
        .collect();
    let primary_raw: Vec<Option<f64>> = primary_idx
        .iter()
        .map(|&idx| comparisons[idx].p_mann_whitney)
        .collect();
    for (&idx, adj) in primary_idx.iter().zip(adjust(&primary_raw, config.apply_fdr)) {
        let comp = &mut comparisons[idx];
        comp.p_mann_whitney_primary_adj = adj;
        comp.primary_significant = is_significant(adj, config.alpha);
    }

    let power_table: Vec<PowerRow> = primary_idx
        .iter()
        .map(|&idx| power_row(&comparisons[idx], config))
        .collect();

    let recommended = power_table
        .iter()
        .filter_map(|row| row.n_required_per_group)
        .max()
        .unwrap_or(1)
        .max(1);

    let counts = ComparisonCounts {
        comparisons_total: comparisons.len(),
        comparisons_primary: primary_idx.len(),
    };
    debug!(
        total = counts.comparisons_total,
        primary = counts.comparisons_primary,
        global_significant = comparisons.iter().filter(|c| c.significant).count(),
        primary_significant = comparisons.iter().filter(|c| c.primary_significant).count(),
        recommended_runs = recommended,
        "protocol annotated"
    );

    FrequentistProtocol {
        config: config.clone(),
        counts,
        run_recommendation: RunRecommendation {
            recommended_runs_per_condition: recommended,
            basis: RECOMMENDATION_BASIS.to_string(),
        },
        power_table,
    }
}

fn power_row(comp: &Comparison, config: &ProtocolConfig) -> PowerRow {
    let observed = comp.cohens_d.abs();
    let target = if observed.is_finite() {
        observed.max(config.min_effect_size_d)
    } else {
        config.min_effect_size_d
    };
    let n_current = comp.n_baseline.min(comp.n_compare);
    let n_required = required_n_per_group(target, config.alpha, config.power_target);

    PowerRow {
        suite: comp.suite.clone(),
        metric_name: comp.metric_name.clone(),
        compare_tags: comp.compare_tags.clone(),
        n_current,
        effect_size_observed_d: observed,
        effect_size_target_d: target,
        alpha: config.alpha,
        power_target: config.power_target,
        n_required_per_group: n_required,
        is_power_sufficient: n_required.is_some_and(|n| n_current as u64 >= n),
    }
}
