//! # tiered-eval: Metrics Aggregation for Tiered-Memory Experiments
//!
//! **Version**: 0.1.0
//!
//! tiered-eval turns raw benchmark measurements into statistically defensible
//! comparisons against a baseline condition: records are grouped by
//! suite/metric/tag set, every treatment group is matched to its baseline
//! group, and the resulting comparisons are corrected for multiple testing
//! and checked for adequate replication.
//!
//! ## Design Principles
//!
//! - **Fail fast on design errors**: a Suite A metric missing a required
//!   memory tier aborts the aggregation instead of producing a partial report
//! - **Absence is data**: indeterminate tests yield `None`, never `0.0`
//! - **Reproducible**: bootstrap resampling is seeded, so identical input
//!   gives bit-identical output
//! - **Explicit configuration**: [`config::AnalysisConfig`] is passed in,
//!   nothing is process-global
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use tiered_eval::analysis::Analyzer;
//! use tiered_eval::ingest;
//!
//! let records = ingest::load_metrics("output/metrics.jsonl")?;
//! let report = Analyzer::default().aggregate(&records)?;
//!
//! for comp in report.comparisons.iter().filter(|c| c.primary_significant) {
//!     println!("{} {:?}: delta {:.3}", comp.metric_name, comp.compare_tags, comp.delta_mean);
//! }
//! # Ok::<(), tiered_eval::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod experiment;
pub mod ingest;
pub mod stats;
pub mod table;

pub use analysis::{aggregate_metrics, AggregateReport, Analyzer};
pub use config::AnalysisConfig;
pub use error::{Error, Result};
pub use experiment::MetricRecord;
