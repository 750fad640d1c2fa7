//! Report schema produced by an aggregation
//!
//! Indeterminate statistics serialize as JSON `null` so presentation layers
//! can render "no data" instead of a misleading zero.

use serde::{Deserialize, Serialize};

use crate::config::{BootstrapConfig, ProtocolConfig};
use crate::experiment::{MetricGroup, NormalizedTags};
use crate::stats::{bootstrap_ci, mean, median, std};

/// Varying dimension a comparison was made along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    /// `memory_tier`, baseline `no-memory`
    MemoryTier,
    /// `scenario`, baseline `baseline`
    Scenario,
}

/// Descriptive summary of one metric group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    /// Suite identifier
    pub suite: String,
    /// Metric name
    pub metric_name: String,
    /// Normalized tags
    pub tags: NormalizedTags,
    /// Number of observations
    pub n: usize,
    /// Mean
    pub mean: f64,
    /// Median
    pub median: f64,
    /// Sample standard deviation
    pub std: f64,
    /// Bootstrap interval lower bound
    pub ci_low: f64,
    /// Bootstrap interval upper bound
    pub ci_high: f64,
    /// Raw observations in arrival order
    pub values: Vec<f64>,
    /// Sorted distinct run ids
    pub run_ids: Vec<String>,
}

impl GroupSummary {
    /// Summarize a group.
    #[must_use]
    pub fn from_group(group: &MetricGroup, bootstrap: &BootstrapConfig) -> Self {
        let (ci_low, ci_high) = bootstrap_ci(&group.values, bootstrap);
        Self {
            suite: group.suite.clone(),
            metric_name: group.metric_name.clone(),
            tags: group.tags.clone(),
            n: group.len(),
            mean: mean(&group.values),
            median: median(&group.values),
            std: std(&group.values),
            ci_low,
            ci_high,
            values: group.values.clone(),
            run_ids: group.distinct_run_ids(),
        }
    }
}

/// One treatment group measured against its baseline group.
///
/// Effect sizes and `delta_mean` are oriented compare-minus-baseline: a
/// positive value means the compare condition scored higher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// Suite identifier
    pub suite: String,
    /// Metric name
    pub metric_name: String,
    /// Dimension that differs between the two groups
    pub dimension: Dimension,
    /// Tags of the baseline group
    pub baseline_tags: NormalizedTags,
    /// Tags of the compare group
    pub compare_tags: NormalizedTags,
    /// Baseline sample size
    pub n_baseline: usize,
    /// Compare sample size
    pub n_compare: usize,
    /// Baseline mean
    pub mean_baseline: f64,
    /// Compare mean
    pub mean_compare: f64,
    /// `mean_compare - mean_baseline`
    pub delta_mean: f64,
    /// Cohen's d (compare vs baseline)
    pub cohens_d: f64,
    /// Cliff's delta (compare vs baseline)
    pub cliffs_delta: f64,
    /// Mann-Whitney U of the compare sample
    pub u_mann_whitney: Option<f64>,
    /// Mann-Whitney two-sided p-value
    pub p_mann_whitney: Option<f64>,
    /// Kolmogorov-Smirnov D
    pub d_ks: Option<f64>,
    /// Kolmogorov-Smirnov two-sided p-value
    pub p_ks: Option<f64>,
    /// Metric is a primary outcome
    pub is_primary: bool,
    /// Mann-Whitney p-value adjusted across all comparisons
    pub p_mann_whitney_adj: Option<f64>,
    /// `p_mann_whitney_adj <= alpha`
    pub significant: bool,
    /// Mann-Whitney p-value adjusted across primary comparisons only
    pub p_mann_whitney_primary_adj: Option<f64>,
    /// `p_mann_whitney_primary_adj <= alpha`
    pub primary_significant: bool,
}

/// Comparison counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonCounts {
    /// All comparisons
    pub comparisons_total: usize,
    /// Comparisons on primary metrics
    pub comparisons_primary: usize,
}

/// Replication recommendation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecommendation {
    /// Runs per condition needed for every primary outcome (at least 1)
    pub recommended_runs_per_condition: u64,
    /// How the number was derived
    pub basis: String,
}

/// Power analysis for one primary comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerRow {
    /// Suite identifier
    pub suite: String,
    /// Metric name
    pub metric_name: String,
    /// Tags of the compare group
    pub compare_tags: NormalizedTags,
    /// Smaller of the two observed group sizes
    pub n_current: usize,
    /// `|cohens_d|` observed
    pub effect_size_observed_d: f64,
    /// Effect size planned for: `max(observed, min_effect_size_d)`
    pub effect_size_target_d: f64,
    /// Significance threshold used
    pub alpha: f64,
    /// Power target used
    pub power_target: f64,
    /// Observations needed per group
    pub n_required_per_group: Option<u64>,
    /// `n_current >= n_required_per_group`
    pub is_power_sufficient: bool,
}

/// Frequentist protocol section of the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequentistProtocol {
    /// Configuration the protocol ran with
    pub config: ProtocolConfig,
    /// Comparison counts
    pub counts: ComparisonCounts,
    /// Replication recommendation
    pub run_recommendation: RunRecommendation,
    /// One row per primary comparison
    pub power_table: Vec<PowerRow>,
}

/// Complete aggregation output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    /// Per-group summaries in first-seen order
    pub groups: Vec<GroupSummary>,
    /// Baseline comparisons, annotated with significance
    pub comparisons: Vec<Comparison>,
    /// Protocol summary
    pub frequentist_protocol: FrequentistProtocol,
}
