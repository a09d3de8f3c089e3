//! Record schema validation
//!
//! Every raw record is checked against a strict schema before anything else
//! looks at it. Rules are applied in a fixed order and the first failure wins:
//!
//! 1. The record must be a JSON object.
//! 2. `id` must be a non-empty string. Failing this leaves nothing to report
//!    the record by, so it is dropped silently.
//! 3. All eight required fields must be present.
//! 4. Field types: `trace_id` non-empty string, `node_id` string, `event_type`
//!    one of START/PROCESS/END, `timestamp_ms` and `logical_clock` numbers,
//!    `payload` object, `causal_ref` null or string.
//!
//! Records failing rules 3-4 still carry a known id and are reported as
//! malformed by that id.

use crate::log_record::{EventType, LogRecord, Numeric};
use serde_json::{Map, Value};
use std::fmt;

/// Fields every record must carry, in check order
pub const REQUIRED_FIELDS: [&str; 8] = [
    "id",
    "trace_id",
    "node_id",
    "event_type",
    "timestamp_ms",
    "logical_clock",
    "payload",
    "causal_ref",
];

/// First schema rule a rejected record broke
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaViolation {
    NotAnObject,
    MissingId,
    MissingField(&'static str),
    EmptyTraceId,
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    UnknownEventType(String),
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaViolation::NotAnObject => write!(f, "record is not an object"),
            SchemaViolation::MissingId => write!(f, "id is missing, empty or not a string"),
            SchemaViolation::MissingField(field) => write!(f, "missing field '{}'", field),
            SchemaViolation::EmptyTraceId => write!(f, "trace_id is empty"),
            SchemaViolation::WrongType { field, expected } => {
                write!(f, "field '{}' must be {}", field, expected)
            }
            SchemaViolation::UnknownEventType(kind) => {
                write!(f, "unknown event_type '{}'", kind)
            }
        }
    }
}

/// Result of validating one raw record
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    Valid(LogRecord),
    Invalid {
        /// Record id, when rule 2 passed
        id: Option<String>,
        violation: SchemaViolation,
    },
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid(_))
    }
}

/// Validate a single raw record
pub fn validate(raw: &Value) -> ValidationOutcome {
    let obj = match raw.as_object() {
        Some(obj) => obj,
        None => {
            return ValidationOutcome::Invalid {
                id: None,
                violation: SchemaViolation::NotAnObject,
            }
        }
    };

    let id = match obj.get("id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => {
            return ValidationOutcome::Invalid {
                id: None,
                violation: SchemaViolation::MissingId,
            }
        }
    };

    match check_fields(obj, &id) {
        Ok(record) => ValidationOutcome::Valid(record),
        Err(violation) => ValidationOutcome::Invalid {
            id: Some(id),
            violation,
        },
    }
}

fn check_fields(obj: &Map<String, Value>, id: &str) -> Result<LogRecord, SchemaViolation> {
    if let Some(missing) = REQUIRED_FIELDS.iter().find(|f| !obj.contains_key(**f)) {
        return Err(SchemaViolation::MissingField(*missing));
    }

    let trace_id = string_field(obj, "trace_id")?;
    if trace_id.is_empty() {
        return Err(SchemaViolation::EmptyTraceId);
    }
    let node_id = string_field(obj, "node_id")?;

    let event_type = match &obj["event_type"] {
        Value::String(s) => {
            EventType::parse(s).ok_or_else(|| SchemaViolation::UnknownEventType(s.clone()))?
        }
        other => return Err(SchemaViolation::UnknownEventType(other.to_string())),
    };

    let timestamp_ms = number_field(obj, "timestamp_ms")?;
    let logical_clock = number_field(obj, "logical_clock")?;

    if !obj["payload"].is_object() {
        return Err(SchemaViolation::WrongType {
            field: "payload",
            expected: "an object",
        });
    }

    let causal_ref = match &obj["causal_ref"] {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        _ => {
            return Err(SchemaViolation::WrongType {
                field: "causal_ref",
                expected: "null or a string",
            })
        }
    };

    Ok(LogRecord {
        id: id.to_string(),
        trace_id: trace_id.to_string(),
        node_id: node_id.to_string(),
        event_type,
        timestamp_ms,
        logical_clock,
        causal_ref,
        raw: obj.clone(),
    })
}

fn string_field<'a>(
    obj: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, SchemaViolation> {
    obj[field].as_str().ok_or(SchemaViolation::WrongType {
        field,
        expected: "a string",
    })
}

fn number_field(
    obj: &Map<String, Value>,
    field: &'static str,
) -> Result<Numeric, SchemaViolation> {
    match &obj[field] {
        Value::Number(n) => Numeric::from_number(n),
        _ => None,
    }
    .ok_or(SchemaViolation::WrongType {
        field,
        expected: "a number",
    })
}

/// Valid records and reportable malformed ids, both in input order
#[derive(Debug, Clone, Default)]
pub struct ValidatedBatch {
    pub valid: Vec<LogRecord>,
    pub malformed_ids: Vec<String>,
    /// Records rejected without a usable id
    pub dropped: usize,
}

/// Partition raw records into valid records and malformed ids
pub fn partition(raw_logs: &[Value]) -> ValidatedBatch {
    let mut batch = ValidatedBatch::default();

    for raw in raw_logs {
        match validate(raw) {
            ValidationOutcome::Valid(record) => batch.valid.push(record),
            ValidationOutcome::Invalid {
                id: Some(id),
                violation,
            } => {
                tracing::debug!("Malformed record '{}': {}", id, violation);
                batch.malformed_ids.push(id);
            }
            ValidationOutcome::Invalid {
                id: None,
                violation,
            } => {
                tracing::debug!("Dropping record without usable id: {}", violation);
                batch.dropped += 1;
            }
        }
    }

    batch
}
