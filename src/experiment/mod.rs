//! Experiment records, tag normalization and grouping
//!
//! ## Data Flow
//!
//! ```text
//! MetricRecord (N) ──normalize──> NormalizedTags
//!        │
//!        └──group_records──> MetricGroup (suite, metric_name, tags)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use tiered_eval::experiment::{group_records, MetricRecord};
//!
//! let records = vec![
//!     MetricRecord::builder("A", "suite_a.accuracy", 0.8)
//!         .tag("memory_tier", "Recent")
//!         .run_id("run-001")
//!         .build(),
//!     MetricRecord::builder("A", "suite_a.accuracy", 0.7)
//!         .tag("memory_tier", "no-memory")
//!         .run_id("run-002")
//!         .build(),
//! ];
//!
//! let groups = group_records(&records);
//! assert_eq!(groups.len(), 1);
//! assert_eq!(groups[0].tags.memory_tier(), Some("no-memory"));
//! ```

mod group;
mod metric_record;
mod store;
mod tags;

pub use group::{group_records, validate_required_tiers, GroupKey, MetricGroup, REQUIRED_TIERS};
pub use metric_record::{coerce_value, MetricRecord, MetricRecordBuilder};
pub use store::RecordStore;
pub use tags::{
    canonical_tier, NormalizedTags, BASELINE_SCENARIO, MEMORY_TIER_KEY, NO_MEMORY_TIER,
    SCENARIO_KEY, VOLATILE_TAG_KEYS,
};
