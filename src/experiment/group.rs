//! Grouping engine - partitions records into homogeneous metric groups

use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::debug;

use super::tags::NormalizedTags;
use super::MetricRecord;
use crate::{Error, Result};

/// Tiers every Suite A accuracy-family metric must cover.
pub const REQUIRED_TIERS: [&str; 5] = ["no-memory", "summary", "vector", "graph", "hybrid"];

/// Suite whose tier coverage is validated.
const VALIDATED_SUITE: &str = "A";

/// Metric family (name prefix) whose tier coverage is validated.
const VALIDATED_METRIC_PREFIX: &str = "suite_a.";

/// Group identity: suite, metric name and the sorted normalized tag set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey {
    /// Suite identifier
    pub suite: String,
    /// Metric name
    pub metric_name: String,
    /// Normalized tags (sorted by construction)
    pub tags: NormalizedTags,
}

/// All observations that share one `GroupKey`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricGroup {
    /// Suite identifier
    pub suite: String,
    /// Metric name
    pub metric_name: String,
    /// Normalized tags shared by every member
    pub tags: NormalizedTags,
    /// Observed values in arrival order
    pub values: Vec<f64>,
    /// Contributing run ids in arrival order (may repeat)
    pub run_ids: Vec<String>,
}

impl MetricGroup {
    fn empty(key: GroupKey) -> Self {
        Self {
            suite: key.suite,
            metric_name: key.metric_name,
            tags: key.tags,
            values: Vec::new(),
            run_ids: Vec::new(),
        }
    }

    /// Number of observations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the group holds no observations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Rebuild this group's identity.
    #[must_use]
    pub fn key(&self) -> GroupKey {
        GroupKey {
            suite: self.suite.clone(),
            metric_name: self.metric_name.clone(),
            tags: self.tags.clone(),
        }
    }

    /// Sorted, de-duplicated run ids.
    #[must_use]
    pub fn distinct_run_ids(&self) -> Vec<String> {
        self.run_ids
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Partition records into groups in a single pass.
///
/// Output order is the order in which each key was first seen.
pub fn group_records<'a, I>(records: I) -> Vec<MetricGroup>
where
    I: IntoIterator<Item = &'a MetricRecord>,
{
    let mut index: FxHashMap<GroupKey, usize> = FxHashMap::default();
    let mut groups: Vec<MetricGroup> = Vec::new();

    for record in records {
        let key = GroupKey {
            suite: record.suite().to_string(),
            metric_name: record.metric_name().to_string(),
            tags: record.normalized_tags(),
        };
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push(MetricGroup::empty(key));
            groups.len() - 1
        });

        let group = &mut groups[slot];
        group.values.push(record.value());
        if !record.run_id().is_empty() {
            group.run_ids.push(record.run_id().to_string());
        }
    }

    debug!(groups = groups.len(), "grouped metric records");
    groups
}

/// Fail fast when a Suite A `suite_a.*` metric is missing a required tier.
///
/// Only metrics that carry a `memory_tier` tag somewhere are checked; metrics
/// are visited in name order so the reported failure is deterministic.
///
/// # Errors
///
/// Returns [`Error::ExperimentDesign`] naming the first incomplete metric.
pub fn validate_required_tiers(groups: &[MetricGroup]) -> Result<()> {
    let mut tiers_by_metric: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for group in groups {
        if group.suite != VALIDATED_SUITE || !group.metric_name.starts_with(VALIDATED_METRIC_PREFIX) {
            continue;
        }
        if let Some(tier) = group.tags.memory_tier().filter(|t| !t.is_empty()) {
            tiers_by_metric
                .entry(group.metric_name.as_str())
                .or_default()
                .insert(tier);
        }
    }

    for (metric_name, tiers) in tiers_by_metric {
        let mut missing: Vec<String> = REQUIRED_TIERS
            .iter()
            .filter(|tier| !tiers.contains(*tier))
            .map(|tier| (*tier).to_string())
            .collect();
        if !missing.is_empty() {
            missing.sort();
            return Err(Error::ExperimentDesign {
                metric_name: metric_name.to_string(),
                missing,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiered(metric: &str, tier: &str, value: f64) -> MetricRecord {
        MetricRecord::builder("A", metric, value)
            .tag("memory_tier", tier)
            .build()
    }

    #[test]
    fn test_groups_keep_first_seen_order() {
        let records = vec![
            tiered("suite_a.accuracy", "hybrid", 0.9),
            tiered("suite_a.accuracy", "no-memory", 0.2),
            tiered("suite_a.accuracy", "hybrid", 0.8),
        ];
        let groups = group_records(&records);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].tags.memory_tier(), Some("hybrid"));
        assert_eq!(groups[0].values, vec![0.9, 0.8]);
        assert_eq!(groups[1].values, vec![0.2]);
    }

    #[test]
    fn test_recent_and_no_memory_share_group() {
        let records = vec![
            tiered("suite_a.accuracy", "recent", 0.1),
            tiered("suite_a.accuracy", "No-Memory", 0.2),
        ];
        let groups = group_records(&records);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 2);
    }

    #[test]
    fn test_volatile_tags_do_not_split_groups() {
        let records = vec![
            MetricRecord::builder("B", "load.rps", 10.0)
                .tag("scenario", "baseline")
                .tag("run_name", "first")
                .run_id("r1")
                .build(),
            MetricRecord::builder("B", "load.rps", 12.0)
                .tag("scenario", "baseline")
                .tag("run_name", "second")
                .run_id("r2")
                .build(),
        ];
        let groups = group_records(&records);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].run_ids, vec!["r1", "r2"]);
    }

    #[test]
    fn test_distinct_run_ids_sorted() {
        let records = vec![
            MetricRecord::builder("C", "completion.hash", 1.0).run_id("r2").build(),
            MetricRecord::builder("C", "completion.hash", 1.0).run_id("r1").build(),
            MetricRecord::builder("C", "completion.hash", 0.0).run_id("r2").build(),
            MetricRecord::new("C", "completion.hash", 1.0),
        ];
        let groups = group_records(&records);
        assert_eq!(groups[0].distinct_run_ids(), vec!["r1", "r2"]);
        assert_eq!(groups[0].len(), 4);
    }

    #[test]
    fn test_validate_accepts_full_tier_set() {
        let records: Vec<MetricRecord> = REQUIRED_TIERS
            .iter()
            .map(|tier| tiered("suite_a.accuracy", tier, 0.5))
            .collect();
        assert!(validate_required_tiers(&group_records(&records)).is_ok());
    }

    #[test]
    fn test_validate_reports_missing_tiers() {
        let records = vec![
            tiered("suite_a.accuracy", "no-memory", 0.2),
            tiered("suite_a.accuracy", "hybrid", 0.8),
        ];
        let err = validate_required_tiers(&group_records(&records)).unwrap_err();
        match err {
            Error::ExperimentDesign { metric_name, missing } => {
                assert_eq!(metric_name, "suite_a.accuracy");
                assert_eq!(missing, vec!["graph", "summary", "vector"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_ignores_other_suites_and_untiered_metrics() {
        let records = vec![
            MetricRecord::builder("B", "suite_a.accuracy", 0.1)
                .tag("memory_tier", "hybrid")
                .build(),
            MetricRecord::new("A", "suite_a.accuracy", 0.1),
            MetricRecord::builder("A", "load.p95_ms", 5.0)
                .tag("memory_tier", "hybrid")
                .build(),
        ];
        assert!(validate_required_tiers(&group_records(&records)).is_ok());
    }
}
