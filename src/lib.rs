//! Causeway - causal timeline reconstruction for distributed log records
//!
//! This library validates raw JSON log records, groups them into traces,
//! classifies incomplete or dangling traces, orders each complete trace by
//! its explicit causal references, detects clock-skew inversions, and merges
//! the result into one global timeline with an anomaly report.

pub mod causal_graph;
pub mod clock_skew;
pub mod cli;
pub mod config;
pub mod error;
pub mod log_index;
pub mod log_record;
pub mod pipeline;
pub mod report;
pub mod timeline;
pub mod trace_group;
pub mod validation;

pub use config::{InputDocument, RunConfig, SystemConfig};
pub use error::{CausewayError, Result};
pub use pipeline::{reconstruct, run, Reconstruction};
pub use report::{AnomalyReport, TimelineOutput};
