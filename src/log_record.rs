//! Validated log record schema
//!
//! A [`LogRecord`] is produced only by [`crate::validation::validate`] and is
//! never mutated afterwards. Alongside the typed fields it keeps the original
//! JSON object, so a record written back into the timeline has exactly the
//! field shape (and field order) it arrived with, extra fields included.
//!
//! # Record Shape
//!
//! ```text
//! {
//!   "id":            "a1",          non-empty string
//!   "trace_id":      "t1",          non-empty string
//!   "node_id":       "node-3",      string, may be empty
//!   "event_type":    "START",       START | PROCESS | END
//!   "timestamp_ms":  1700000000000, number (wall clock, unsynchronized)
//!   "logical_clock": 1,             number (tie-break hint only)
//!   "payload":       { ... },       object, opaque
//!   "causal_ref":    null           null | string (predecessor id)
//! }
//! ```

use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value};
use std::cmp::Ordering;
use std::fmt;

/// A numeric record field, kept exact when it arrived as an integer
///
/// Integer timestamps and clocks beyond 2^53 do not survive a trip through
/// `f64`, so integers compare as integers. Comparisons between an integer
/// and a float are exact as well.
#[derive(Debug, Clone, Copy)]
pub enum Numeric {
    Int(i128),
    Float(f64),
}

impl Numeric {
    /// Convert a JSON number, integers first
    pub fn from_number(n: &Number) -> Option<Self> {
        if let Some(i) = n.as_i64() {
            Some(Numeric::Int(i128::from(i)))
        } else if let Some(u) = n.as_u64() {
            Some(Numeric::Int(i128::from(u)))
        } else {
            n.as_f64().map(Numeric::Float)
        }
    }

    /// Nearest `f64`, for display and drift arithmetic
    pub fn as_f64(self) -> f64 {
        match self {
            Numeric::Int(i) => i as f64,
            Numeric::Float(f) => f,
        }
    }

    /// `self - other` in milliseconds, exact for two integers
    pub fn minus(self, other: Self) -> f64 {
        match (self, other) {
            (Numeric::Int(a), Numeric::Int(b)) => (a - b) as f64,
            _ => self.as_f64() - other.as_f64(),
        }
    }
}

fn cmp_int_float(i: i128, f: f64) -> Ordering {
    // Rounding to nearest is monotone, so a strict f64 ordering is the real
    // one. On a tie `f` is integral and fits in i128.
    match (i as f64).total_cmp(&f) {
        Ordering::Equal => i.cmp(&(f as i128)),
        other => other,
    }
}

impl Ord for Numeric {
    fn cmp(&self, other: &Self) -> Ordering {
        match (*self, *other) {
            (Numeric::Int(a), Numeric::Int(b)) => a.cmp(&b),
            (Numeric::Float(a), Numeric::Float(b)) => a.total_cmp(&b),
            (Numeric::Int(a), Numeric::Float(b)) => cmp_int_float(a, b),
            (Numeric::Float(a), Numeric::Int(b)) => cmp_int_float(b, a).reverse(),
        }
    }
}

impl PartialOrd for Numeric {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Numeric {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Numeric {}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Numeric::Int(i) => write!(f, "{}", i),
            Numeric::Float(x) => write!(f, "{}", x),
        }
    }
}

/// Event marker kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventType {
    /// Trace-open marker
    Start,
    /// Intermediate activity
    Process,
    /// Trace-close marker
    End,
}

impl EventType {
    /// Parse the wire spelling of an event type (case-sensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "START" => Some(EventType::Start),
            "PROCESS" => Some(EventType::Process),
            "END" => Some(EventType::End),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Start => "START",
            EventType::Process => "PROCESS",
            EventType::End => "END",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A schema-valid log record
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub(crate) id: String,
    pub(crate) trace_id: String,
    pub(crate) node_id: String,
    pub(crate) event_type: EventType,
    pub(crate) timestamp_ms: Numeric,
    pub(crate) logical_clock: Numeric,
    pub(crate) causal_ref: Option<String>,
    /// The record exactly as read, payload included
    pub(crate) raw: Map<String, Value>,
}

impl LogRecord {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    pub fn timestamp_ms(&self) -> Numeric {
        self.timestamp_ms
    }

    pub fn logical_clock(&self) -> Numeric {
        self.logical_clock
    }

    /// Identifier of the immediate causal predecessor, `None` for a root event
    pub fn causal_ref(&self) -> Option<&str> {
        self.causal_ref.as_deref()
    }

    /// Opaque payload object, passed through unchanged
    pub fn payload(&self) -> Option<&Map<String, Value>> {
        self.raw.get("payload").and_then(Value::as_object)
    }

    /// Original JSON object this record was validated from
    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }

    /// Returns true if this event has no causal predecessor
    pub fn is_root(&self) -> bool {
        self.causal_ref.is_none()
    }

    /// Tie-break ordering for causally concurrent records:
    /// logical clock first, wall-clock timestamp second.
    pub fn cmp_concurrent(&self, other: &Self) -> Ordering {
        self.logical_clock
            .cmp(&other.logical_clock)
            .then_with(|| self.timestamp_ms.cmp(&other.timestamp_ms))
    }
}

impl Serialize for LogRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}
