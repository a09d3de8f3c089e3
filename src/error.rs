//! Fatal error types for a reconstruction run
//!
//! Only I/O and document-level parse failures abort a run. Every per-record or
//! per-trace problem is reported as data through the anomaly report instead.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a reconstruction run
#[derive(Error, Debug)]
pub enum CausewayError {
    #[error("Failed to read input document {}: {source}", .path.display())]
    ReadInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Input document is not valid: {0}")]
    ParseInput(#[from] serde_json::Error),

    #[error("Failed to write output document {}: {source}", .path.display())]
    WriteOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize output document: {0}")]
    SerializeOutput(serde_json::Error),

    #[error("Invalid run configuration: {0}")]
    Config(String),
}

/// Result type for reconstruction runs
pub type Result<T> = std::result::Result<T, CausewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_input_message_names_path() {
        let err = CausewayError::ReadInput {
            path: PathBuf::from("input/input.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        let msg = err.to_string();
        assert!(msg.contains("input/input.json"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_parse_error_converts() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: CausewayError = parse.into();
        assert!(matches!(err, CausewayError::ParseInput(_)));
    }
}
