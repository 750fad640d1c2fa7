//! Metric Record - one raw measurement emitted by a benchmark run

use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::tags::{scalar_to_string, NormalizedTags};

/// Metric Record represents a single measurement as emitted by the harness.
///
/// Records are immutable once read. Deserialization is lenient the same way
/// the harness output is: a missing or `null` string field becomes empty, and
/// `value` is coerced to a float (see [`coerce_value`]). A `value` that cannot
/// be coerced fails deserialization rather than being recorded as zero.
///
/// ## Wire Format
///
/// One JSON object per line:
///
/// ```text
/// {"suite":"A","metric_name":"suite_a.accuracy","value":0.8,"run_id":"r1","tags":{"memory_tier":"hybrid"}}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    suite: String,
    #[serde(default, deserialize_with = "lenient_string")]
    metric_name: String,
    #[serde(default, deserialize_with = "lenient_value")]
    value: f64,
    #[serde(default, deserialize_with = "lenient_string")]
    run_id: String,
    #[serde(default, deserialize_with = "lenient_tags")]
    tags: BTreeMap<String, Value>,
}

impl MetricRecord {
    /// Create a new metric record without tags or run id.
    ///
    /// # Arguments
    ///
    /// * `suite` - Experiment suite identifier (e.g., "A")
    /// * `metric_name` - Dotted metric name (e.g., "suite_a.accuracy")
    /// * `value` - Measured value
    #[must_use]
    pub fn new(suite: impl Into<String>, metric_name: impl Into<String>, value: f64) -> Self {
        Self {
            suite: suite.into(),
            metric_name: metric_name.into(),
            value,
            run_id: String::new(),
            tags: BTreeMap::new(),
        }
    }

    /// Create a builder for constructing a metric record with optional fields.
    #[must_use]
    pub fn builder(
        suite: impl Into<String>,
        metric_name: impl Into<String>,
        value: f64,
    ) -> MetricRecordBuilder {
        MetricRecordBuilder::new(suite, metric_name, value)
    }

    /// Get the suite identifier.
    #[must_use]
    pub fn suite(&self) -> &str {
        &self.suite
    }

    /// Get the metric name.
    #[must_use]
    pub fn metric_name(&self) -> &str {
        &self.metric_name
    }

    /// Get the metric value.
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// Get the run ID (empty when the harness did not report one).
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Get the raw tags as emitted.
    #[must_use]
    pub const fn tags(&self) -> &BTreeMap<String, Value> {
        &self.tags
    }

    /// Get the tags after normalization.
    #[must_use]
    pub fn normalized_tags(&self) -> NormalizedTags {
        NormalizedTags::normalize(&self.tags)
    }
}

/// Builder for `MetricRecord`.
#[derive(Debug)]
pub struct MetricRecordBuilder {
    record: MetricRecord,
}

impl MetricRecordBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(suite: impl Into<String>, metric_name: impl Into<String>, value: f64) -> Self {
        Self {
            record: MetricRecord::new(suite, metric_name, value),
        }
    }

    /// Set the run ID.
    #[must_use]
    pub fn run_id(mut self, run_id: impl Into<String>) -> Self {
        self.record.run_id = run_id.into();
        self
    }

    /// Add a tag.
    #[must_use]
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.record.tags.insert(key.into(), value.into());
        self
    }

    /// Build the `MetricRecord`.
    #[must_use]
    pub fn build(self) -> MetricRecord {
        self.record
    }
}

/// Coerce a JSON value to a float.
///
/// - numbers pass through, numeric strings are parsed (surrounding
///   whitespace allowed)
/// - booleans map to 1/0
/// - empty values (`null`, `""`, `[]`, `{}`) become `0.0`
///
/// Returns `None` for anything else: non-numeric text or a non-empty
/// array/object.
#[must_use]
pub fn coerce_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if s.is_empty() => Some(0.0),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(f64::from(u8::from(*b))),
        Value::Null => Some(0.0),
        Value::Array(items) => items.is_empty().then_some(0.0),
        Value::Object(fields) => fields.is_empty().then_some(0.0),
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => String::new(),
        other => scalar_to_string(&other),
    })
}

fn lenient_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    coerce_value(&value).ok_or_else(|| D::Error::custom(format!("value is not numeric: {value}")))
}

fn lenient_tags<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, Value>, D::Error> {
    Ok(Option::<BTreeMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}
