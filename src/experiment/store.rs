//! Record Store - in-memory, de-duplicating collection of metric records
//!
//! Metrics discovery may surface the same measurement through several files
//! (a consolidated export plus the per-run artifact it was built from). The
//! store keeps the first copy of each record and preserves arrival order.

use rustc_hash::FxHashSet;

use super::MetricRecord;

/// In-memory store of ingested metric records.
///
/// ## Design
///
/// Identity is the record's canonical JSON serialization. Tags are held in a
/// sorted map, so two records that differ only in key order collapse.
#[derive(Debug, Default)]
pub struct RecordStore {
    records: Vec<MetricRecord>,
    seen: FxHashSet<String>,
    duplicates: usize,
}

impl RecordStore {
    /// Create a new empty record store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Get the number of distinct records in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Get the number of records rejected as duplicates.
    #[must_use]
    pub const fn duplicate_count(&self) -> usize {
        self.duplicates
    }

    /// Add a record, returning `false` if an identical one is already stored.
    pub fn add_record(&mut self, record: MetricRecord) -> bool {
        // Serializing a record of strings, floats and JSON values cannot fail.
        let key = serde_json::to_string(&record).unwrap_or_default();
        if self.seen.insert(key) {
            self.records.push(record);
            true
        } else {
            self.duplicates += 1;
            false
        }
    }

    /// Add many records.
    pub fn extend<I: IntoIterator<Item = MetricRecord>>(&mut self, records: I) {
        for record in records {
            self.add_record(record);
        }
    }

    /// Borrow the stored records in arrival order.
    #[must_use]
    pub fn records(&self) -> &[MetricRecord] {
        &self.records
    }

    /// Consume the store, yielding records in arrival order.
    #[must_use]
    pub fn into_records(self) -> Vec<MetricRecord> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_default() {
        let store = RecordStore::new();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
        assert_eq!(store.duplicate_count(), 0);
    }

    #[test]
    fn test_store_rejects_duplicates() {
        let mut store = RecordStore::new();
        let record = MetricRecord::builder("A", "suite_a.accuracy", 0.5)
            .tag("memory_tier", "graph")
            .run_id("r1")
            .build();

        assert!(store.add_record(record.clone()));
        assert!(!store.add_record(record));
        assert_eq!(store.len(), 1);
        assert_eq!(store.duplicate_count(), 1);
    }

    #[test]
    fn test_store_keeps_arrival_order() {
        let mut store = RecordStore::new();
        store.extend([
            MetricRecord::new("A", "m", 3.0),
            MetricRecord::new("A", "m", 1.0),
            MetricRecord::new("A", "m", 3.0),
            MetricRecord::new("A", "m", 2.0),
        ]);

        let values: Vec<f64> = store.records().iter().map(MetricRecord::value).collect();
        assert_eq!(values, vec![3.0, 1.0, 2.0]);
    }
}
