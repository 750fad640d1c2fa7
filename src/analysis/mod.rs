//! Aggregation entry point
//!
//! [`Analyzer`] runs the full pipeline over an in-memory record list:
//!
//! ```text
//! records ──group──> MetricGroup ──validate tiers──> GroupSummary
//!                         │
//!                         └──baseline match──> Comparison ──annotate──> AggregateReport
//! ```
//!
//! No I/O happens here; see [`crate::ingest`] for loading records.
//!
//! ## Example
//!
//! ```rust
//! use tiered_eval::analysis::Analyzer;
//! use tiered_eval::experiment::MetricRecord;
//!
//! let records: Vec<MetricRecord> = ["no-memory", "summary", "vector", "graph", "hybrid"]
//!     .iter()
//!     .flat_map(|tier| {
//!         (0_i32..3).map(move |i| {
//!             MetricRecord::builder("A", "suite_a.accuracy", 0.5 + f64::from(i) * 0.1)
//!                 .tag("memory_tier", *tier)
//!                 .build()
//!         })
//!     })
//!     .collect();
//!
//! let report = Analyzer::default().aggregate(&records)?;
//! assert_eq!(report.groups.len(), 5);
//! assert_eq!(report.comparisons.len(), 4);
//! # Ok::<(), tiered_eval::Error>(())
//! ```

mod baseline;
mod protocol;
mod report;

pub use baseline::{build_comparisons, VaryingDimension};
pub use protocol::{annotate, RECOMMENDATION_BASIS};
pub use report::{
    AggregateReport, Comparison, ComparisonCounts, Dimension, FrequentistProtocol, GroupSummary,
    PowerRow, RunRecommendation,
};

#[cfg(feature = "rayon")]
use rayon::prelude::*;
use tracing::info;

use crate::config::AnalysisConfig;
use crate::experiment::{group_records, validate_required_tiers, MetricGroup, MetricRecord};
use crate::stats::{HypothesisTests, NonparametricTests};
use crate::Result;

/// Aggregates metric records into an [`AggregateReport`].
pub struct Analyzer {
    config: AnalysisConfig,
    tests: Box<dyn HypothesisTests>,
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self {
            config: AnalysisConfig::default(),
            tests: Box::new(NonparametricTests),
        }
    }
}

impl Analyzer {
    /// Create an analyzer with the nonparametric test implementation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`](crate::Error::InvalidConfig) when the
    /// configuration fails validation.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        Self::with_tests(config, NonparametricTests)
    }

    /// Create an analyzer with a specific hypothesis-test capability.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`](crate::Error::InvalidConfig) when the
    /// configuration fails validation.
    pub fn with_tests(config: AnalysisConfig, tests: impl HypothesisTests + 'static) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            tests: Box::new(tests),
        })
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run the full aggregation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExperimentDesign`](crate::Error::ExperimentDesign)
    /// when a Suite A metric lacks a required memory tier. No partial report
    /// is produced.
    pub fn aggregate(&self, records: &[MetricRecord]) -> Result<AggregateReport> {
        let groups = group_records(records);
        validate_required_tiers(&groups)?;

        let summaries = self.summarize(&groups);
        let mut comparisons =
            build_comparisons(&groups, self.tests.as_ref(), self.config.dual_dimension);
        let frequentist_protocol = annotate(&mut comparisons, &self.config.protocol);

        info!(
            records = records.len(),
            groups = summaries.len(),
            comparisons = comparisons.len(),
            recommended_runs = frequentist_protocol
                .run_recommendation
                .recommended_runs_per_condition,
            "aggregation complete"
        );

        Ok(AggregateReport {
            groups: summaries,
            comparisons,
            frequentist_protocol,
        })
    }

    #[cfg(feature = "rayon")]
    fn summarize(&self, groups: &[MetricGroup]) -> Vec<GroupSummary> {
        groups
            .par_iter()
            .map(|g| GroupSummary::from_group(g, &self.config.bootstrap))
            .collect()
    }

    #[cfg(not(feature = "rayon"))]
    fn summarize(&self, groups: &[MetricGroup]) -> Vec<GroupSummary> {
        groups
            .iter()
            .map(|g| GroupSummary::from_group(g, &self.config.bootstrap))
            .collect()
    }
}

/// Aggregate `records` under `config` with the nonparametric tests.
///
/// # Errors
///
/// See [`Analyzer::new`] and [`Analyzer::aggregate`].
pub fn aggregate_metrics(records: &[MetricRecord], config: &AnalysisConfig) -> Result<AggregateReport> {
    Analyzer::new(config.clone())?.aggregate(records)
}
