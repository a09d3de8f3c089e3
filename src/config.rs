//! Input document schema and run configuration
//!
//! Two kinds of configuration feed a run:
//!
//! - [`SystemConfig`], embedded in the input document under `system_config`
//! - [`RunConfig`], where to read and write and how to print, optionally
//!   loaded from a TOML file and overridden by command-line flags
//!
//! # Example TOML
//! ```toml
//! input_path = "input/input.json"
//! output_path = "output/output.json"
//! pretty = true
//! print_summary = true
//! ```

use crate::error::{CausewayError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Settings carried inside the input document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Tolerated wall-clock drift between nodes (ms)
    ///
    /// Read and echoed in diagnostics. Skew events are counted by sign
    /// regardless of this value. A non-numeric value falls back to the
    /// default instead of rejecting the document.
    #[serde(
        default = "default_max_clock_drift_ms",
        deserialize_with = "lenient_drift"
    )]
    pub max_clock_drift_ms: f64,
}

fn default_max_clock_drift_ms() -> f64 {
    5000.0
}

fn lenient_drift<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_f64().unwrap_or_else(|| {
        tracing::warn!(
            "Ignoring non-numeric max_clock_drift_ms {}, using {}",
            value,
            default_max_clock_drift_ms()
        );
        default_max_clock_drift_ms()
    }))
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            max_clock_drift_ms: default_max_clock_drift_ms(),
        }
    }
}

/// The whole input document
///
/// Records stay as raw JSON values here; they are only trusted after
/// [`crate::validation::validate`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputDocument {
    #[serde(default)]
    pub raw_logs: Vec<Value>,
    #[serde(default)]
    pub system_config: SystemConfig,
}

impl InputDocument {
    /// Parse an input document from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read and parse an input document from disk
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| CausewayError::ReadInput {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }
}

/// Where a run reads from, writes to, and how it reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    /// Two-space indented output
    pub pretty: bool,
    /// Print the run summary to stdout when done
    pub print_summary: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("input").join("input.json"),
            output_path: PathBuf::from("output").join("output.json"),
            pretty: true,
            print_summary: true,
        }
    }
}

impl RunConfig {
    /// Parse a run configuration from TOML text; absent keys keep defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| CausewayError::Config(e.to_string()))
    }

    /// Load a run configuration from a TOML file
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            CausewayError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.input_path.as_os_str().is_empty() {
            return Err(CausewayError::Config("input_path must not be empty".into()));
        }
        if self.output_path.as_os_str().is_empty() {
            return Err(CausewayError::Config("output_path must not be empty".into()));
        }
        if self.input_path == self.output_path {
            return Err(CausewayError::Config(format!(
                "input_path and output_path are the same file: {}",
                self.input_path.display()
            )));
        }
        Ok(())
    }
}
