//! Error types for tiered-eval
//!
//! Every variant is fatal for the aggregation call that raised it. Statistical
//! indeterminacy (empty samples, unavailable tests) is data, not an error, and
//! travels as `None` fields in the report instead.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// tiered-eval error types
#[derive(Error, Debug)]
pub enum Error {
    /// Metrics source path does not exist
    #[error("metrics file not found: {}", .0.display())]
    MissingInput(PathBuf),

    /// Suite A accuracy-family metrics do not cover every required tier
    #[error("Missing required memory tiers in Suite A metric {metric_name}: {missing:?}\nEvery comparison would be misleading without the full tier set; re-run the missing conditions.")]
    ExperimentDesign {
        /// Metric whose tier coverage is incomplete
        metric_name: String,
        /// Tiers that were expected but never observed (sorted)
        missing: Vec<String>,
    },

    /// A JSONL line could not be parsed as a metric record
    #[error("malformed metric record at {}:{line}: {source}", .path.display())]
    MalformedRecord {
        /// File being ingested
        path: PathBuf,
        /// 1-based line number
        line: usize,
        /// Underlying parse failure
        #[source]
        source: serde_json::Error,
    },

    /// Protocol or bootstrap configuration outside its valid domain
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A metrics input pattern is not a valid glob
    #[error("invalid metrics pattern {pattern}: {source}")]
    InvalidPattern {
        /// Pattern as given on the command line
        pattern: String,
        /// Underlying glob parse failure
        #[source]
        source: globset::Error,
    },

    /// Discovery produced no metrics files to analyze
    #[error("no metrics files found for analysis")]
    NoInputs,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
