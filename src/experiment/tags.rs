//! Tag normalization - strips provenance keys and canonicalizes tiers

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tag keys that identify a particular run rather than an experimental condition.
///
/// Keeping them would split otherwise identical conditions into singleton groups.
pub const VOLATILE_TAG_KEYS: [&str; 6] = [
    "run_name",
    "source_run_id",
    "source_uid",
    "step",
    "snapshot_id",
    "snapshot_created_at",
];

/// Tag naming the memory tier condition.
pub const MEMORY_TIER_KEY: &str = "memory_tier";

/// Tag naming the load/fault scenario condition.
pub const SCENARIO_KEY: &str = "scenario";

/// Baseline value of the memory tier dimension.
pub const NO_MEMORY_TIER: &str = "no-memory";

/// Baseline value of the scenario dimension.
pub const BASELINE_SCENARIO: &str = "baseline";

/// Legacy tier label that predates `no-memory`.
const LEGACY_RECENT_TIER: &str = "recent";

/// Canonicalize a memory tier label (trim, lower-case, `recent` -> `no-memory`).
#[must_use]
pub fn canonical_tier(value: &str) -> String {
    let raw = value.trim().to_lowercase();
    if raw == LEGACY_RECENT_TIER {
        NO_MEMORY_TIER.to_string()
    } else {
        raw
    }
}

/// Render an arbitrary JSON scalar the way it appears in a tag value.
pub(crate) fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Normalized tag set: string values, volatile keys removed, tier canonicalized.
///
/// Backed by a `BTreeMap`, so iteration is always sorted by key and two tag
/// sets compare equal regardless of the order the keys arrived in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedTags(BTreeMap<String, String>);

impl NormalizedTags {
    /// Normalize raw record tags.
    ///
    /// Normalization is idempotent: feeding the output back through
    /// [`NormalizedTags::to_raw`] and `normalize` yields the same tags.
    #[must_use]
    pub fn normalize(tags: &BTreeMap<String, Value>) -> Self {
        let mut normalized: BTreeMap<String, String> = tags
            .iter()
            .filter(|(key, _)| !VOLATILE_TAG_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), scalar_to_string(value)))
            .collect();

        if let Some(tier) = normalized.get_mut(MEMORY_TIER_KEY) {
            *tier = canonical_tier(tier);
        }

        Self(normalized)
    }

    /// Convert back into the raw tag representation used by records.
    #[must_use]
    pub fn to_raw(&self) -> BTreeMap<String, Value> {
        self.0
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect()
    }

    /// Get a tag value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Check whether a tag key is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// The canonical memory tier, if tagged.
    #[must_use]
    pub fn memory_tier(&self) -> Option<&str> {
        self.get(MEMORY_TIER_KEY)
    }

    /// The scenario, if tagged.
    #[must_use]
    pub fn scenario(&self) -> Option<&str> {
        self.get(SCENARIO_KEY)
    }

    /// Copy of these tags with one key removed.
    #[must_use]
    pub fn without(&self, key: &str) -> Self {
        let mut tags = self.0.clone();
        tags.remove(key);
        Self(tags)
    }

    /// Iterate tags in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no tags.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for NormalizedTags {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> BTreeMap<String, Value> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_volatile_keys_removed() {
        let tags = NormalizedTags::normalize(&raw(json!({
            "memory_tier": "vector",
            "run_name": "nightly-7",
            "source_run_id": "abc",
            "source_uid": "u1",
            "step": 3,
            "snapshot_id": "s",
            "snapshot_created_at": "2026-01-01",
        })));
        assert_eq!(tags.len(), 1);
        assert_eq!(tags.memory_tier(), Some("vector"));
    }

    #[test]
    fn test_recent_tier_is_no_memory() {
        for label in ["recent", "Recent", "  RECENT "] {
            let tags = NormalizedTags::normalize(&raw(json!({ "memory_tier": label })));
            assert_eq!(tags.memory_tier(), Some(NO_MEMORY_TIER));
        }
    }

    #[test]
    fn test_tier_case_folded_and_trimmed() {
        let tags = NormalizedTags::normalize(&raw(json!({ "memory_tier": " Hybrid" })));
        assert_eq!(tags.memory_tier(), Some("hybrid"));
    }

    #[test]
    fn test_scalar_values_stringified() {
        let tags = NormalizedTags::normalize(&raw(json!({
            "seed": 7,
            "ratio": 0.5,
            "warm": true,
            "note": null,
        })));
        assert_eq!(tags.get("seed"), Some("7"));
        assert_eq!(tags.get("ratio"), Some("0.5"));
        assert_eq!(tags.get("warm"), Some("true"));
        assert_eq!(tags.get("note"), Some("null"));
    }

    #[test]
    fn test_without_leaves_original_untouched() {
        let tags: NormalizedTags = [("memory_tier", "graph"), ("scenario", "baseline")]
            .into_iter()
            .collect();
        let stripped = tags.without(MEMORY_TIER_KEY);
        assert!(!stripped.contains(MEMORY_TIER_KEY));
        assert!(tags.contains(MEMORY_TIER_KEY));
    }

    #[test]
    fn test_normalize_idempotent() {
        let once = NormalizedTags::normalize(&raw(json!({
            "memory_tier": "Recent",
            "scenario": "fault-light",
            "step": 12,
        })));
        let twice = NormalizedTags::normalize(&once.to_raw());
        assert_eq!(once, twice);
    }
}
