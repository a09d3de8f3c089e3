//! Record index and orphan detection
//!
//! The index maps record id to record over the whole valid set and is the
//! only thing causal references are resolved against. It is built once and
//! read-only afterwards. Duplicate ids follow last-write-wins: the record
//! appearing later in input order replaces the earlier one.

use crate::log_record::LogRecord;
use std::collections::{BTreeSet, HashMap};

/// Immutable id -> record lookup over the valid set
#[derive(Debug, Clone, Default)]
pub struct LogIndex<'a> {
    by_id: HashMap<&'a str, &'a LogRecord>,
    /// Ids whose earlier entry was overwritten, in overwrite order
    duplicates: Vec<&'a str>,
}

impl<'a> LogIndex<'a> {
    /// Build the index from validated records in input order
    pub fn build(records: &'a [LogRecord]) -> Self {
        let mut by_id = HashMap::with_capacity(records.len());
        let mut duplicates = Vec::new();

        for record in records {
            if by_id.insert(record.id(), record).is_some() {
                tracing::warn!(
                    "Duplicate record id '{}': later record replaces earlier index entry",
                    record.id()
                );
                duplicates.push(record.id());
            }
        }

        Self { by_id, duplicates }
    }

    /// Look up a record by id
    pub fn get(&self, id: &str) -> Option<&'a LogRecord> {
        self.by_id.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Resolve a record's causal predecessor, if it has one and it exists
    pub fn predecessor_of(&self, record: &LogRecord) -> Option<&'a LogRecord> {
        record.causal_ref().and_then(|id| self.get(id))
    }

    /// Number of distinct ids
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn duplicate_ids(&self) -> &[&'a str] {
        &self.duplicates
    }
}

/// Find records whose causal reference names an id absent from the index
///
/// Trace membership plays no part: a reference into another trace resolves
/// fine. Orphans are only identified here, they stay in the pipeline.
pub fn detect_orphans<'a>(records: &'a [LogRecord], index: &LogIndex<'_>) -> BTreeSet<&'a str> {
    records
        .iter()
        .filter(|r| matches!(r.causal_ref(), Some(target) if !index.contains(target)))
        .map(LogRecord::id)
        .collect()
}
