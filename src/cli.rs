//! CLI argument parsing for tiered-eval

use std::path::PathBuf;

use clap::Parser;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "tiered-eval")]
#[command(version)]
#[command(
    about = "Aggregate tiered-memory benchmark metrics into baseline comparisons",
    long_about = None
)]
pub struct Cli {
    /// Metrics file, directory or glob pattern (repeatable). Directories are searched for metrics.jsonl
    #[arg(
        long = "metrics",
        value_name = "PATH",
        default_values = ["output/metrics.jsonl", "artifacts"]
    )]
    pub metrics: Vec<PathBuf>,

    /// Directory receiving analysis.json and analysis.csv
    #[arg(long = "output-dir", value_name = "DIR", default_value = "output")]
    pub output_dir: PathBuf,

    /// JSON analysis configuration; fields not named keep their defaults
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable trace-level logging to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["tiered-eval"]);
        assert_eq!(
            cli.metrics,
            vec![PathBuf::from("output/metrics.jsonl"), PathBuf::from("artifacts")]
        );
        assert_eq!(cli.output_dir, PathBuf::from("output"));
        assert!(cli.config.is_none());
        assert!(!cli.debug);
    }

    #[test]
    fn test_cli_repeated_metrics_replace_defaults() {
        let cli = Cli::parse_from(["tiered-eval", "--metrics", "a.jsonl", "--metrics", "runs"]);
        assert_eq!(cli.metrics, vec![PathBuf::from("a.jsonl"), PathBuf::from("runs")]);
    }

    #[test]
    fn test_cli_config_and_debug() {
        let cli = Cli::parse_from([
            "tiered-eval",
            "--config",
            "analysis.json",
            "--output-dir",
            "out",
            "--debug",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("analysis.json")));
        assert_eq!(cli.output_dir, PathBuf::from("out"));
        assert!(cli.debug);
    }
}
