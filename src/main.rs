use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use serde::Serialize;
use tiered_eval::analysis::{AggregateReport, Analyzer};
use tiered_eval::config::AnalysisConfig;
use tiered_eval::{cli::Cli, ingest, table, Error};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber; `--debug` forces trace level
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Report as written to `analysis.json`
#[derive(Serialize)]
struct AnalysisDocument<'a> {
    generated_at: String,
    source_metrics: Vec<String>,
    #[serde(flatten)]
    report: &'a AggregateReport,
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    let Some(path) = path else {
        return Ok(AnalysisConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    AnalysisConfig::from_json(&text)
        .with_context(|| format!("invalid config {}", path.display()))
}

fn write_outputs(output_dir: &Path, sources: &[PathBuf], report: &AggregateReport) -> Result<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let document = AnalysisDocument {
        generated_at: Utc::now().to_rfc3339(),
        source_metrics: sources.iter().map(|p| p.display().to_string()).collect(),
        report,
    };
    let json_path = output_dir.join("analysis.json");
    fs::write(&json_path, serde_json::to_string_pretty(&document)?)
        .with_context(|| format!("failed to write {}", json_path.display()))?;

    let csv_path = output_dir.join("analysis.csv");
    fs::write(&csv_path, table::to_csv(&table::flatten(report)))
        .with_context(|| format!("failed to write {}", csv_path.display()))?;

    info!(json = %json_path.display(), csv = %csv_path.display(), "analysis written");
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.debug);

    let config = load_config(args.config.as_deref())?;
    let sources = ingest::expand_paths(&args.metrics)?;
    if sources.is_empty() {
        return Err(Error::NoInputs.into());
    }

    let records = ingest::load_metrics_from_paths(&sources).context("failed to load metrics")?;
    let report = Analyzer::new(config)?
        .aggregate(&records)
        .context("aggregation failed")?;

    write_outputs(&args.output_dir, &sources, &report)
}
