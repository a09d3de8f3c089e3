//! Global timeline merge
//!
//! Sorted traces are laid end to end, ordered by the earliest wall-clock
//! timestamp each one contains. Events of different traces are never
//! interleaved: only trace launch order is reconstructed across traces.

use crate::log_record::{LogRecord, Numeric};
use std::cmp::Ordering;

/// A complete trace after causal sorting
#[derive(Debug, Clone, PartialEq)]
pub struct SortedTrace<'a> {
    pub trace_id: &'a str,
    pub records: Vec<&'a LogRecord>,
}

impl<'a> SortedTrace<'a> {
    /// Earliest timestamp in the trace, `None` when empty
    pub fn start_time(&self) -> Option<Numeric> {
        self.records.iter().map(|r| r.timestamp_ms()).min()
    }
}

fn cmp_start(a: Option<Numeric>, b: Option<Numeric>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Order traces by start time and concatenate their records
///
/// Traces with equal start times keep their incoming order; empty traces
/// sort last.
pub fn merge_timeline<'a>(mut traces: Vec<SortedTrace<'a>>) -> Vec<&'a LogRecord> {
    traces.sort_by(|a, b| cmp_start(a.start_time(), b.start_time()));
    traces.into_iter().flat_map(|t| t.records).collect()
}
