//! Metrics ingestion from newline-delimited JSON files
//!
//! Benchmark runs leave their measurements in two kinds of places:
//!
//! ```text
//! output/metrics.jsonl                          consolidated export
//! artifacts/suite_<x>/<run>/metrics.jsonl       one file per run
//! ```
//!
//! [`expand_paths`] turns CLI inputs (files, directories or `*` patterns)
//! into an ordered file list, [`load_metrics_from_paths`] loads them and
//! drops records seen twice.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use globset::GlobBuilder;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::experiment::{MetricRecord, RecordStore};
use crate::{Error, Result};

/// File name searched for inside directories.
pub const METRICS_FILE_NAME: &str = "metrics.jsonl";

/// Directory name that triggers the `suite_*/run/metrics.jsonl` layout.
pub const ARTIFACTS_DIR_NAME: &str = "artifacts";

/// Characters that end the literal prefix of a glob pattern.
const GLOB_META: [char; 4] = ['*', '?', '[', '{'];

/// Load every record of one JSONL file.
///
/// Blank lines are skipped.
///
/// # Errors
///
/// - [`Error::MissingInput`] if `path` does not exist
/// - [`Error::MalformedRecord`] with the 1-based line number of the first
///   line that is not a valid record
/// - [`Error::Io`] on read failure
pub fn load_metrics(path: impl AsRef<Path>) -> Result<Vec<MetricRecord>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::MissingInput(path.to_path_buf()));
    }

    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record =
            serde_json::from_str(&line).map_err(|source| Error::MalformedRecord {
                path: path.to_path_buf(),
                line: idx + 1,
                source,
            })?;
        records.push(record);
    }

    debug!(path = %path.display(), records = records.len(), "loaded metrics file");
    Ok(records)
}

fn sorted_subdirs(dir: &Path) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_dir())
        .map(walkdir::DirEntry::into_path)
        .collect();
    dirs.sort();
    dirs
}

fn artifact_files(dir: &Path) -> Vec<PathBuf> {
    sorted_subdirs(dir)
        .into_iter()
        .filter(|suite| {
            suite
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("suite_"))
        })
        .flat_map(|suite| sorted_subdirs(&suite))
        .map(|run| run.join(METRICS_FILE_NAME))
        .filter(|file| file.is_file())
        .collect()
}

fn walk_metrics_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(error = %err, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file() && e.file_name() == METRICS_FILE_NAME)
        .map(walkdir::DirEntry::into_path)
        .collect();
    files.sort();
    files
}

/// Split a pattern into the directory to walk and the pattern relative to it.
///
/// The root is the run of leading components without glob syntax; `.` when
/// the pattern starts with a wildcard.
fn split_glob(pattern: &str) -> (PathBuf, String) {
    let parts: Vec<&str> = pattern.split('/').collect();
    let literal = parts
        .iter()
        .take_while(|part| !part.contains(&GLOB_META[..]))
        .count();
    let root = parts[..literal].join("/");
    let rest = parts[literal..].join("/");
    let root = match root.as_str() {
        "" if pattern.starts_with('/') => PathBuf::from("/"),
        "" => PathBuf::from("."),
        _ => PathBuf::from(root),
    };
    (root, rest)
}

/// Files matching `pattern`, sorted. `*` stays within one path component,
/// `**` crosses directories. Relative patterns resolve against the working
/// directory and yield relative paths.
fn glob_files(pattern: &str) -> Result<Vec<PathBuf>> {
    let (root, rest) = split_glob(pattern);
    let matcher = GlobBuilder::new(&rest)
        .literal_separator(true)
        .build()
        .map_err(|source| Error::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?
        .compile_matcher();

    let mut walker = WalkDir::new(&root).min_depth(1);
    if !rest.contains("**") {
        walker = walker.max_depth(rest.split('/').count());
    }
    let relative_root = root == Path::new(".");

    let mut files: Vec<PathBuf> = walker
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let rel = e.path().strip_prefix(&root).ok()?.to_path_buf();
            if !matcher.is_match(&rel) {
                return None;
            }
            Some(if relative_root { rel } else { e.into_path() })
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Expand CLI inputs into metrics files.
///
/// - a file is kept as-is
/// - a directory named `artifacts` yields `suite_*/<run>/metrics.jsonl`,
///   suites then runs in name order
/// - any other directory is searched recursively for `metrics.jsonl`
/// - an input containing `*` is expanded as a glob over files, sorted
/// - other paths that do not exist are dropped
///
/// # Errors
///
/// Returns [`Error::InvalidPattern`] for a malformed glob.
pub fn expand_paths<P: AsRef<Path>>(inputs: &[P]) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for input in inputs {
        let input = input.as_ref();
        if input.is_file() {
            out.push(input.to_path_buf());
        } else if input.is_dir() {
            let is_artifacts = input.file_name().is_some_and(|n| n == ARTIFACTS_DIR_NAME);
            let found = if is_artifacts {
                artifact_files(input)
            } else {
                walk_metrics_files(input)
            };
            debug!(dir = %input.display(), files = found.len(), "expanded metrics directory");
            out.extend(found);
        } else if let Some(pattern) = input.to_str().filter(|s| s.contains('*')) {
            let found = glob_files(pattern)?;
            debug!(pattern, files = found.len(), "expanded metrics pattern");
            out.extend(found);
        } else {
            debug!(path = %input.display(), "metrics input not found, skipping");
        }
    }
    Ok(out)
}

/// Load and de-duplicate records from many files.
///
/// Paths that are not regular files at load time are skipped.
///
/// # Errors
///
/// Propagates the first [`load_metrics`] failure.
pub fn load_metrics_from_paths<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<MetricRecord>> {
    let mut store = RecordStore::new();
    let mut files = 0usize;
    for path in paths {
        let path = path.as_ref();
        if !path.is_file() {
            debug!(path = %path.display(), "not a regular file, skipping");
            continue;
        }
        store.extend(load_metrics(path)?);
        files += 1;
    }

    info!(
        files,
        records = store.len(),
        duplicates = store.duplicate_count(),
        "metrics ingested"
    );
    Ok(store.into_records())
}
