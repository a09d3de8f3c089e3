//! Trace grouping and completeness classification
//!
//! Valid records are partitioned by `trace_id`. Each trace is then classified
//! as complete or corrupted. Only complete traces go on to be sorted.

use crate::log_index::LogIndex;
use crate::log_record::{EventType, LogRecord};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Records of one trace, in input order
#[derive(Debug, Clone)]
pub struct Trace<'a> {
    pub trace_id: &'a str,
    pub records: Vec<&'a LogRecord>,
}

impl<'a> Trace<'a> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn has_event(&self, kind: EventType) -> bool {
        self.records.iter().any(|r| r.event_type() == kind)
    }
}

/// Partition records by trace id
///
/// Traces come back in order of first appearance, and records inside a trace
/// keep their input order.
pub fn group_by_trace(records: &[LogRecord]) -> Vec<Trace<'_>> {
    let mut traces: Vec<Trace<'_>> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for record in records {
        let slot = *positions.entry(record.trace_id()).or_insert_with(|| {
            traces.push(Trace {
                trace_id: record.trace_id(),
                records: Vec::new(),
            });
            traces.len() - 1
        });
        traces[slot].records.push(record);
    }

    traces
}

/// Why a trace was classified as corrupted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CorruptionReason {
    /// No START record
    MissingInit,
    /// No END record
    MissingEnd,
    /// A causal reference names an id absent from the global index
    BrokenCausalChain,
}

impl CorruptionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CorruptionReason::MissingInit => "missing_init",
            CorruptionReason::MissingEnd => "missing_end",
            CorruptionReason::BrokenCausalChain => "broken_causal_chain",
        }
    }
}

impl fmt::Display for CorruptionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Completeness verdict for one trace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceStatus {
    Complete,
    Corrupted(CorruptionReason),
}

impl TraceStatus {
    pub fn is_complete(&self) -> bool {
        matches!(self, TraceStatus::Complete)
    }
}

/// Classify a trace, reporting the first failing check
///
/// Checks run in order: START present, END present, every causal reference
/// resolves in the global index. A reference into a different trace counts
/// as resolved.
pub fn check_completeness(trace: &Trace<'_>, index: &LogIndex<'_>) -> TraceStatus {
    if !trace.has_event(EventType::Start) {
        return TraceStatus::Corrupted(CorruptionReason::MissingInit);
    }
    if !trace.has_event(EventType::End) {
        return TraceStatus::Corrupted(CorruptionReason::MissingEnd);
    }

    let dangling = trace
        .records
        .iter()
        .filter_map(|r| r.causal_ref())
        .any(|target| !index.contains(target));
    if dangling {
        return TraceStatus::Corrupted(CorruptionReason::BrokenCausalChain);
    }

    TraceStatus::Complete
}
