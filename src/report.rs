//! Output document, anomaly report and run diagnostics
//!
//! The output document has a fixed external shape:
//!
//! ```json
//! {
//!   "sorted_timeline": [ ...records in original shape... ],
//!   "anomaly_report": {
//!     "corrupted_traces": ["t3", "t7"],
//!     "orphaned_logs_count": 2,
//!     "clock_skew_events_count": 1,
//!     "malformed_logs": ["log-9"]
//!   }
//! }
//! ```
//!
//! [`Diagnostics`] holds the detail behind those counts and never appears in
//! the output document.

use crate::clock_skew::ClockSkewEvent;
use crate::log_record::LogRecord;
use crate::trace_group::CorruptionReason;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Anomaly section of the output document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyReport {
    /// Corrupted trace ids, lexicographically sorted
    pub corrupted_traces: Vec<String>,
    pub orphaned_logs_count: usize,
    pub clock_skew_events_count: usize,
    /// Malformed record ids, lexicographically sorted
    pub malformed_logs: Vec<String>,
}

impl AnomalyReport {
    /// Assemble the report, sorting both id lists
    pub fn assemble(
        mut corrupted_traces: Vec<String>,
        orphaned_logs_count: usize,
        clock_skew_events_count: usize,
        mut malformed_logs: Vec<String>,
    ) -> Self {
        corrupted_traces.sort();
        malformed_logs.sort();
        Self {
            corrupted_traces,
            orphaned_logs_count,
            clock_skew_events_count,
            malformed_logs,
        }
    }

    /// Returns true if nothing anomalous was found
    pub fn is_clean(&self) -> bool {
        self.corrupted_traces.is_empty()
            && self.orphaned_logs_count == 0
            && self.clock_skew_events_count == 0
            && self.malformed_logs.is_empty()
    }
}

/// The complete output document
#[derive(Debug, Clone, Default, Serialize)]
pub struct TimelineOutput {
    pub sorted_timeline: Vec<LogRecord>,
    pub anomaly_report: AnomalyReport,
}

impl TimelineOutput {
    /// Serialize the document, two-space indented when `pretty`
    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }

    /// Ids of the timeline records, in timeline order
    pub fn timeline_ids(&self) -> Vec<&str> {
        self.sorted_timeline.iter().map(LogRecord::id).collect()
    }
}

/// Detail behind the anomaly report
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    pub raw_count: usize,
    pub valid_count: usize,
    /// Rejected records that had no usable id
    pub dropped_count: usize,
    pub trace_count: usize,
    pub corruption_reasons: BTreeMap<String, CorruptionReason>,
    pub orphaned_ids: BTreeSet<String>,
    pub clock_skew_events: Vec<ClockSkewEvent>,
    /// Records left out of their trace's order by a trace-local cycle
    pub unresolved_records: BTreeMap<String, Vec<String>>,
    /// Ids that replaced an earlier index entry
    pub duplicate_ids: Vec<String>,
    pub max_clock_drift_ms: f64,
}

impl Diagnostics {
    /// Skew events whose inversion exceeds the configured drift
    pub fn skew_beyond_drift(&self) -> usize {
        self.clock_skew_events
            .iter()
            .filter(|e| e.exceeds(self.max_clock_drift_ms))
            .count()
    }

    pub fn complete_trace_count(&self) -> usize {
        self.trace_count - self.corruption_reasons.len()
    }
}

/// End-of-run summary printed for the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub raw_count: usize,
    pub valid_count: usize,
    pub timeline_len: usize,
    pub malformed_count: usize,
    pub corrupted_count: usize,
    pub orphaned_count: usize,
    pub clock_skew_count: usize,
}

impl RunSummary {
    pub fn new(output: &TimelineOutput, diagnostics: &Diagnostics) -> Self {
        let report = &output.anomaly_report;
        Self {
            raw_count: diagnostics.raw_count,
            valid_count: diagnostics.valid_count,
            timeline_len: output.sorted_timeline.len(),
            malformed_count: report.malformed_logs.len(),
            corrupted_count: report.corrupted_traces.len(),
            orphaned_count: report.orphaned_logs_count,
            clock_skew_count: report.clock_skew_events_count,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "===== Reconstruction Summary =====")?;
        writeln!(f, "Raw records:        {}", self.raw_count)?;
        writeln!(f, "Valid records:      {}", self.valid_count)?;
        writeln!(f, "Timeline records:   {}", self.timeline_len)?;
        writeln!(f, "Malformed records:  {}", self.malformed_count)?;
        writeln!(f, "Corrupted traces:   {}", self.corrupted_count)?;
        writeln!(f, "Orphaned records:   {}", self.orphaned_count)?;
        write!(f, "Clock skew events:  {}", self.clock_skew_count)
    }
}
