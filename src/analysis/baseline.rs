//! Baseline matching - pairs each treatment group with its baseline group
//!
//! A group's baseline shares every tag except the single varying dimension,
//! which is pinned to that dimension's baseline value:
//!
//! | tags contain          | varies along  | baseline value |
//! |-----------------------|---------------|----------------|
//! | `memory_tier` only    | `memory_tier` | `no-memory`    |
//! | `scenario` only       | `scenario`    | `baseline`     |
//! | both                  | per [`DualDimensionPolicy`] (default: not compared) |
//! | neither               | -             | not compared   |

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use super::report::{Comparison, Dimension};
use crate::config::DualDimensionPolicy;
use crate::experiment::{
    MetricGroup, NormalizedTags, BASELINE_SCENARIO, MEMORY_TIER_KEY, NO_MEMORY_TIER, SCENARIO_KEY,
};
use crate::stats::{cliffs_delta, cohens_d, mean, HypothesisTests};

impl Dimension {
    /// Tag key of this dimension.
    #[must_use]
    pub const fn tag_key(self) -> &'static str {
        match self {
            Self::MemoryTier => MEMORY_TIER_KEY,
            Self::Scenario => SCENARIO_KEY,
        }
    }

    /// Level that serves as the baseline.
    #[must_use]
    pub const fn baseline_level(self) -> &'static str {
        match self {
            Self::MemoryTier => NO_MEMORY_TIER,
            Self::Scenario => BASELINE_SCENARIO,
        }
    }
}

/// How a group participates in baseline matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaryingDimension {
    /// Varies along `memory_tier`.
    TierVarying {
        /// This group's tier
        level: String,
        /// Remaining tags, shared with the baseline
        rest: NormalizedTags,
    },
    /// Varies along `scenario`.
    ScenarioVarying {
        /// This group's scenario
        level: String,
        /// Remaining tags, shared with the baseline
        rest: NormalizedTags,
    },
    /// Not compared: no recognized dimension, or both under
    /// [`DualDimensionPolicy::Exclude`].
    Unmatched,
}

impl VaryingDimension {
    /// Classify a group's tags.
    #[must_use]
    pub fn classify(tags: &NormalizedTags, policy: DualDimensionPolicy) -> Self {
        let tier = || Self::TierVarying {
            level: tags.memory_tier().unwrap_or_default().to_string(),
            rest: tags.without(MEMORY_TIER_KEY),
        };
        match (tags.memory_tier(), tags.scenario(), policy) {
            (Some(_), None, _) | (Some(_), Some(_), DualDimensionPolicy::PreferMemoryTier) => tier(),
            (None, Some(scenario), _) => Self::ScenarioVarying {
                level: scenario.to_string(),
                rest: tags.without(SCENARIO_KEY),
            },
            (Some(_), Some(_), DualDimensionPolicy::Exclude) | (None, None, _) => Self::Unmatched,
        }
    }

    fn parts(&self) -> Option<(Dimension, &str, &NormalizedTags)> {
        match self {
            Self::TierVarying { level, rest } => Some((Dimension::MemoryTier, level.as_str(), rest)),
            Self::ScenarioVarying { level, rest } => Some((Dimension::Scenario, level.as_str(), rest)),
            Self::Unmatched => None,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Hash)]
struct SlotKey<'a> {
    suite: &'a str,
    metric_name: &'a str,
    dimension: Dimension,
    rest: &'a NormalizedTags,
    level: &'a str,
}

/// Build one comparison per group that has a distinct baseline group.
///
/// Comparisons come out in group order. Protocol fields (`is_primary`,
/// adjusted p-values, significance) are left unset for the annotator.
pub fn build_comparisons(
    groups: &[MetricGroup],
    tests: &dyn HypothesisTests,
    policy: DualDimensionPolicy,
) -> Vec<Comparison> {
    let classes: Vec<VaryingDimension> = groups
        .iter()
        .map(|g| VaryingDimension::classify(&g.tags, policy))
        .collect();

    let mut slots: FxHashMap<SlotKey<'_>, usize> = FxHashMap::default();
    for (idx, (group, class)) in groups.iter().zip(&classes).enumerate() {
        if let Some((dimension, level, rest)) = class.parts() {
            slots.insert(
                SlotKey {
                    suite: &group.suite,
                    metric_name: &group.metric_name,
                    dimension,
                    rest,
                    level,
                },
                idx,
            );
        }
    }

    let mut comparisons = Vec::new();
    for (idx, (group, class)) in groups.iter().zip(&classes).enumerate() {
        let Some((dimension, _, rest)) = class.parts() else {
            trace!(metric = %group.metric_name, "group has no single varying dimension");
            continue;
        };
        let baseline_key = SlotKey {
            suite: &group.suite,
            metric_name: &group.metric_name,
            dimension,
            rest,
            level: dimension.baseline_level(),
        };
        match slots.get(&baseline_key) {
            Some(&base_idx) if base_idx != idx => {
                comparisons.push(compare(group, &groups[base_idx], dimension, tests));
            }
            Some(_) => {}
            None => {
                debug!(
                    suite = %group.suite,
                    metric = %group.metric_name,
                    dimension = dimension.tag_key(),
                    "no baseline group found"
                );
            }
        }
    }
    comparisons
}

fn compare(
    group: &MetricGroup,
    baseline: &MetricGroup,
    dimension: Dimension,
    tests: &dyn HypothesisTests,
) -> Comparison {
    let mean_compare = mean(&group.values);
    let mean_baseline = mean(&baseline.values);
    let mw = tests.mann_whitney_u(&group.values, &baseline.values);
    let ks = tests.ks_test(&group.values, &baseline.values);

    Comparison {
        suite: group.suite.clone(),
        metric_name: group.metric_name.clone(),
        dimension,
        baseline_tags: baseline.tags.clone(),
        compare_tags: group.tags.clone(),
        n_baseline: baseline.len(),
        n_compare: group.len(),
        mean_baseline,
        mean_compare,
        delta_mean: mean_compare - mean_baseline,
        cohens_d: cohens_d(&group.values, &baseline.values),
        cliffs_delta: cliffs_delta(&group.values, &baseline.values),
        u_mann_whitney: mw.statistic,
        p_mann_whitney: mw.p_value,
        d_ks: ks.statistic,
        p_ks: ks.p_value,
        is_primary: false,
        p_mann_whitney_adj: None,
        significant: false,
        p_mann_whitney_primary_adj: None,
        primary_significant: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::{group_records, MetricRecord};
    use crate::stats::{NonparametricTests, UnavailableTests};

    const EXCLUDE: DualDimensionPolicy = DualDimensionPolicy::Exclude;

    fn record(metric: &str, tags: &[(&str, &str)], value: f64) -> MetricRecord {
        tags.iter()
            .fold(MetricRecord::builder("A", metric, value), |b, (k, v)| b.tag(*k, *v))
            .build()
    }

    #[test]
    fn test_classify() {
        let tier: NormalizedTags = [("memory_tier", "vector"), ("seed", "1")].into_iter().collect();
        assert_eq!(
            VaryingDimension::classify(&tier, EXCLUDE),
            VaryingDimension::TierVarying {
                level: "vector".into(),
                rest: [("seed", "1")].into_iter().collect(),
            }
        );

        let scenario: NormalizedTags = [("scenario", "fault-light")].into_iter().collect();
        assert!(matches!(
            VaryingDimension::classify(&scenario, EXCLUDE),
            VaryingDimension::ScenarioVarying { .. }
        ));

        let both: NormalizedTags = [("memory_tier", "graph"), ("scenario", "baseline")]
            .into_iter()
            .collect();
        assert_eq!(VaryingDimension::classify(&both, EXCLUDE), VaryingDimension::Unmatched);
        assert_eq!(
            VaryingDimension::classify(&NormalizedTags::default(), EXCLUDE),
            VaryingDimension::Unmatched
        );
    }

    #[test]
    fn test_each_tier_compared_once_against_no_memory() {
        let mut records = Vec::new();
        for (tier, base) in [("no-memory", 0.2), ("summary", 0.4), ("vector", 0.5), ("hybrid", 0.8)] {
            for k in 0..4_i32 {
                records.push(record(
                    "suite_a.accuracy",
                    &[("memory_tier", tier)],
                    base + f64::from(k) * 0.01,
                ));
            }
        }
        let groups = group_records(&records);
        let comparisons = build_comparisons(&groups, &NonparametricTests, EXCLUDE);

        assert_eq!(comparisons.len(), 3);
        for comp in &comparisons {
            assert_eq!(comp.baseline_tags.memory_tier(), Some("no-memory"));
            assert_ne!(comp.compare_tags.memory_tier(), Some("no-memory"));
            assert_eq!(comp.dimension, Dimension::MemoryTier);
        }
    }

    #[test]
    fn test_scenario_baseline() {
        let records = vec![
            record("load.p95_ms", &[("scenario", "baseline")], 100.0),
            record("load.p95_ms", &[("scenario", "fault-heavy")], 180.0),
            record("load.p95_ms", &[("scenario", "fault-light")], 120.0),
        ];
        let comparisons = build_comparisons(&group_records(&records), &NonparametricTests, EXCLUDE);
        assert_eq!(comparisons.len(), 2);
        assert!((comparisons[0].delta_mean - 80.0).abs() < 1e-12);
        assert_eq!(comparisons[0].dimension, Dimension::Scenario);
    }

    #[test]
    fn test_other_tags_must_match() {
        let records = vec![
            record("suite_a.accuracy", &[("memory_tier", "no-memory"), ("seed", "1")], 0.2),
            record("suite_a.accuracy", &[("memory_tier", "hybrid"), ("seed", "2")], 0.9),
        ];
        assert!(build_comparisons(&group_records(&records), &NonparametricTests, EXCLUDE).is_empty());
    }

    #[test]
    fn test_groups_with_both_dimensions_excluded() {
        let records = vec![
            record("suite_a.accuracy", &[("memory_tier", "no-memory"), ("scenario", "baseline")], 0.2),
            record("suite_a.accuracy", &[("memory_tier", "hybrid"), ("scenario", "baseline")], 0.9),
        ];
        assert!(build_comparisons(&group_records(&records), &NonparametricTests, EXCLUDE).is_empty());

        let comparisons = build_comparisons(
            &group_records(&records),
            &NonparametricTests,
            DualDimensionPolicy::PreferMemoryTier,
        );
        assert_eq!(comparisons.len(), 1);
        assert_eq!(comparisons[0].dimension, Dimension::MemoryTier);
        assert_eq!(comparisons[0].baseline_tags.scenario(), Some("baseline"));
    }

    #[test]
    fn test_unavailable_tests_leave_pvalues_null() {
        let records = vec![
            record("load.errors", &[("scenario", "baseline")], 1.0),
            record("load.errors", &[("scenario", "baseline")], 2.0),
            record("load.errors", &[("scenario", "adversarial")], 5.0),
            record("load.errors", &[("scenario", "adversarial")], 7.0),
        ];
        let comparisons = build_comparisons(&group_records(&records), &UnavailableTests, EXCLUDE);
        assert_eq!(comparisons.len(), 1);
        assert!(comparisons[0].p_mann_whitney.is_none());
        assert!(comparisons[0].p_ks.is_none());
        assert!(comparisons[0].cohens_d > 0.0);
    }
}
