//! Flat table view of an aggregate report
//!
//! One row per group. Comparison statistics are attached to the row of the
//! compare-side group; baseline groups and unmatched groups leave them empty.

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::analysis::{AggregateReport, Comparison};
use crate::experiment::NormalizedTags;

/// Column names, in output order.
pub const COLUMNS: [&str; 14] = [
    "suite",
    "metric_name",
    "memory_tier",
    "scenario",
    "n",
    "mean",
    "median",
    "std",
    "ci_low",
    "ci_high",
    "cohens_d",
    "cliffs_delta",
    "p_mann_whitney",
    "p_ks",
];

/// One flattened group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    /// Suite identifier
    pub suite: String,
    /// Metric name
    pub metric_name: String,
    /// `memory_tier` tag, if any
    pub memory_tier: Option<String>,
    /// `scenario` tag, if any
    pub scenario: Option<String>,
    /// Observations
    pub n: usize,
    /// Mean
    pub mean: f64,
    /// Median
    pub median: f64,
    /// Sample standard deviation
    pub std: f64,
    /// Bootstrap lower bound
    pub ci_low: f64,
    /// Bootstrap upper bound
    pub ci_high: f64,
    /// Cohen's d against the baseline
    pub cohens_d: Option<f64>,
    /// Cliff's delta against the baseline
    pub cliffs_delta: Option<f64>,
    /// Mann-Whitney p-value
    pub p_mann_whitney: Option<f64>,
    /// Kolmogorov-Smirnov p-value
    pub p_ks: Option<f64>,
}

/// Flatten groups and their comparisons into rows, in group order.
#[must_use]
pub fn flatten(report: &AggregateReport) -> Vec<TableRow> {
    let by_key: FxHashMap<(&str, &str, &NormalizedTags), &Comparison> = report
        .comparisons
        .iter()
        .map(|c| ((c.suite.as_str(), c.metric_name.as_str(), &c.compare_tags), c))
        .collect();

    report
        .groups
        .iter()
        .map(|g| {
            let comp = by_key.get(&(g.suite.as_str(), g.metric_name.as_str(), &g.tags));
            TableRow {
                suite: g.suite.clone(),
                metric_name: g.metric_name.clone(),
                memory_tier: g.tags.memory_tier().map(str::to_string),
                scenario: g.tags.scenario().map(str::to_string),
                n: g.n,
                mean: g.mean,
                median: g.median,
                std: g.std,
                ci_low: g.ci_low,
                ci_high: g.ci_high,
                cohens_d: comp.map(|c| c.cohens_d),
                cliffs_delta: comp.map(|c| c.cliffs_delta),
                p_mann_whitney: comp.and_then(|c| c.p_mann_whitney),
                p_ks: comp.and_then(|c| c.p_ks),
            }
        })
        .collect()
}

fn text(field: &str) -> String {
    field.replace(',', ";")
}

fn float(value: f64) -> String {
    format!("{value:.6}")
}

fn opt_text(value: Option<&str>) -> String {
    value.map(text).unwrap_or_default()
}

fn opt_float(value: Option<f64>) -> String {
    value.map(float).unwrap_or_default()
}

impl TableRow {
    fn fields(&self) -> [String; COLUMNS.len()] {
        [
            text(&self.suite),
            text(&self.metric_name),
            opt_text(self.memory_tier.as_deref()),
            opt_text(self.scenario.as_deref()),
            self.n.to_string(),
            float(self.mean),
            float(self.median),
            float(self.std),
            float(self.ci_low),
            float(self.ci_high),
            opt_float(self.cohens_d),
            opt_float(self.cliffs_delta),
            opt_float(self.p_mann_whitney),
            opt_float(self.p_ks),
        ]
    }
}

/// Render rows as CSV with a header line.
#[must_use]
pub fn to_csv(rows: &[TableRow]) -> String {
    let mut output = COLUMNS.join(",");
    output.push('\n');
    for row in rows {
        output.push_str(&row.fields().join(","));
        output.push('\n');
    }
    output
}
