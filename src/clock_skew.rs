//! Clock-skew detection over causal edges
//!
//! Wall clocks on different nodes are not synchronized, so a successor can
//! carry an earlier timestamp than the event that caused it. Each such edge
//! is one skew event. Detection is by sign only; the magnitude is kept for
//! diagnostics but never compared against a threshold to decide whether an
//! event counts.

use crate::log_index::LogIndex;
use crate::log_record::LogRecord;
use serde::Serialize;

/// One causal edge whose successor timestamp precedes its predecessor's
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClockSkewEvent {
    pub trace_id: String,
    pub record_id: String,
    pub predecessor_id: String,
    /// How far the successor's timestamp lies before the predecessor's (ms, > 0)
    pub drift_ms: f64,
}

impl ClockSkewEvent {
    /// Returns true if the inversion is larger than the given drift budget
    pub fn exceeds(&self, max_clock_drift_ms: f64) -> bool {
        self.drift_ms > max_clock_drift_ms
    }
}

/// Returns true if `record` is timestamped strictly before its predecessor
pub fn is_skewed(record: &LogRecord, predecessor: &LogRecord) -> bool {
    record.timestamp_ms() < predecessor.timestamp_ms()
}

/// Find skew events along the causal edges of one sorted trace
///
/// Every record whose `causal_ref` resolves in the global index is compared
/// with that predecessor. This includes predecessors in other traces, whose
/// edges never take part in ordering, so the count can exceed the number of
/// inverted trace-local edges. Records missing from `ordered` (unresolved
/// cycle members, corrupted traces) are never looked at.
pub fn detect_clock_skew(ordered: &[&LogRecord], index: &LogIndex<'_>) -> Vec<ClockSkewEvent> {
    ordered
        .iter()
        .filter_map(|record| {
            let predecessor = index.predecessor_of(record)?;
            is_skewed(record, predecessor).then(|| ClockSkewEvent {
                trace_id: record.trace_id().to_string(),
                record_id: record.id().to_string(),
                predecessor_id: predecessor.id().to_string(),
                drift_ms: predecessor.timestamp_ms().minus(record.timestamp_ms()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::partition;
    use serde_json::{json, Value};

    fn rec(id: &str, trace: &str, ts: f64, causal_ref: Option<&str>) -> Value {
        json!({
            "id": id,
            "trace_id": trace,
            "node_id": "n",
            "event_type": "PROCESS",
            "timestamp_ms": ts,
            "logical_clock": 0,
            "payload": {},
            "causal_ref": causal_ref
        })
    }

    fn skew_of(raw: Vec<Value>) -> Vec<ClockSkewEvent> {
        let batch = partition(&raw);
        let index = LogIndex::build(&batch.valid);
        let ordered: Vec<&LogRecord> = batch.valid.iter().collect();
        detect_clock_skew(&ordered, &index)
    }

    #[test]
    fn test_no_skew_on_monotonic_chain() {
        let events = skew_of(vec![
            rec("a", "T", 100.0, None),
            rec("b", "T", 200.0, Some("a")),
            rec("c", "T", 300.0, Some("b")),
        ]);
        assert!(events.is_empty());
    }

    #[test]
    fn test_one_event_per_inverted_edge() {
        let events = skew_of(vec![
            rec("a", "T", 500.0, None),
            rec("b", "T", 400.0, Some("a")),
            rec("c", "T", 450.0, Some("b")),
            rec("d", "T", 100.0, Some("a")),
        ]);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].record_id, "b");
        assert_eq!(events[0].predecessor_id, "a");
        assert_eq!(events[0].drift_ms, 100.0);
        assert_eq!(events[1].record_id, "d");
        assert_eq!(events[1].drift_ms, 400.0);
    }

    #[test]
    fn test_equal_timestamps_not_skew() {
        let events = skew_of(vec![rec("a", "T", 100.0, None), rec("b", "T", 100.0, Some("a"))]);
        assert!(events.is_empty());
    }

    #[test]
    fn test_dangling_reference_ignored() {
        let events = skew_of(vec![rec("b", "T", 1.0, Some("ghost"))]);
        assert!(events.is_empty());
    }

    #[test]
    fn test_cross_trace_predecessor_compared() {
        let raw = vec![rec("x", "OTHER", 900.0, None), rec("b", "T", 100.0, Some("x"))];
        let batch = partition(&raw);
        let index = LogIndex::build(&batch.valid);
        let ordered = vec![&batch.valid[1]];
        let events = detect_clock_skew(&ordered, &index);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].trace_id, "T");
    }

    #[test]
    fn test_skew_exact_beyond_f64_precision() {
        let raw = vec![
            json!({
                "id": "a", "trace_id": "T", "node_id": "n", "event_type": "START",
                "timestamp_ms": 9_007_199_254_740_993u64, "logical_clock": 0,
                "payload": {}, "causal_ref": null
            }),
            json!({
                "id": "b", "trace_id": "T", "node_id": "n", "event_type": "END",
                "timestamp_ms": 9_007_199_254_740_992u64, "logical_clock": 1,
                "payload": {}, "causal_ref": "a"
            }),
        ];
        let events = skew_of(raw);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].drift_ms, 1.0);
    }

    #[test]
    fn test_exceeds_drift_budget() {
        let event = ClockSkewEvent {
            trace_id: "T".into(),
            record_id: "b".into(),
            predecessor_id: "a".into(),
            drift_ms: 6000.0,
        };
        assert!(event.exceeds(5000.0));
        assert!(!event.exceeds(6000.0));
    }
}
