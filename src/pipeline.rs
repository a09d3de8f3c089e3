//! End-to-end reconstruction pipeline
//!
//! ```text
//! raw_logs ─► validate ─► index ─► orphans
//!                 │
//!                 └────► group by trace ─► completeness ─┬─► corrupted ids
//!                                                         │
//!                                     complete traces ◄───┘
//!                                            │
//!                              causal sort ─► clock skew
//!                                            │
//!                                   merge by start time ─► output document
//! ```
//!
//! [`reconstruct`] is pure: it never fails and never touches the filesystem.
//! [`run`] wraps it with the single input read and single output write.

use crate::causal_graph::CausalGraph;
use crate::clock_skew::detect_clock_skew;
use crate::config::{InputDocument, RunConfig};
use crate::error::{CausewayError, Result};
use crate::log_index::{detect_orphans, LogIndex};
use crate::report::{AnomalyReport, Diagnostics, TimelineOutput};
use crate::timeline::{merge_timeline, SortedTrace};
use crate::trace_group::{check_completeness, group_by_trace, TraceStatus};
use crate::validation::partition;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Output document plus the detail behind it
#[derive(Debug, Clone)]
pub struct Reconstruction {
    pub output: TimelineOutput,
    pub diagnostics: Diagnostics,
}

/// Rebuild the causal timeline and anomaly report for one input document
pub fn reconstruct(input: &InputDocument) -> Reconstruction {
    let max_clock_drift_ms = input.system_config.max_clock_drift_ms;
    info!(
        "Reconstructing timeline from {} raw records (max_clock_drift_ms={})",
        input.raw_logs.len(),
        max_clock_drift_ms
    );

    let batch = partition(&input.raw_logs);
    info!(
        "Validation: {} valid, {} malformed, {} dropped without id",
        batch.valid.len(),
        batch.malformed_ids.len(),
        batch.dropped
    );

    let index = LogIndex::build(&batch.valid);
    let orphans = detect_orphans(&batch.valid, &index);
    info!("Orphaned records: {}", orphans.len());

    let traces = group_by_trace(&batch.valid);
    info!("Grouped into {} traces", traces.len());

    let mut diagnostics = Diagnostics {
        raw_count: input.raw_logs.len(),
        valid_count: batch.valid.len(),
        dropped_count: batch.dropped,
        trace_count: traces.len(),
        orphaned_ids: orphans.iter().map(|id| id.to_string()).collect(),
        duplicate_ids: index.duplicate_ids().iter().map(|id| id.to_string()).collect(),
        max_clock_drift_ms,
        ..Diagnostics::default()
    };

    let mut sorted_traces = Vec::new();
    for trace in &traces {
        match check_completeness(trace, &index) {
            TraceStatus::Complete => {
                let order = CausalGraph::from_trace(trace).topological_order();
                if !order.is_fully_resolved() {
                    let ids: Vec<String> =
                        order.unresolved.iter().map(|r| r.id().to_string()).collect();
                    warn!(
                        "Trace '{}': {} records on a causal cycle left out of the timeline: {:?}",
                        trace.trace_id,
                        ids.len(),
                        ids
                    );
                    diagnostics
                        .unresolved_records
                        .insert(trace.trace_id.to_string(), ids);
                }

                let skew = detect_clock_skew(&order.ordered, &index);
                for event in &skew {
                    debug!(
                        "Clock skew in trace '{}': '{}' is {}ms before predecessor '{}'",
                        event.trace_id, event.record_id, event.drift_ms, event.predecessor_id
                    );
                }
                diagnostics.clock_skew_events.extend(skew);

                sorted_traces.push(SortedTrace {
                    trace_id: trace.trace_id,
                    records: order.ordered,
                });
            }
            TraceStatus::Corrupted(reason) => {
                warn!("Trace '{}' is corrupted: {}", trace.trace_id, reason);
                diagnostics
                    .corruption_reasons
                    .insert(trace.trace_id.to_string(), reason);
            }
        }
    }
    info!(
        "Completeness: {} complete, {} corrupted; {} clock skew events",
        sorted_traces.len(),
        diagnostics.corruption_reasons.len(),
        diagnostics.clock_skew_events.len()
    );
    debug!(
        "{} clock skew events exceed max_clock_drift_ms={}",
        diagnostics.skew_beyond_drift(),
        max_clock_drift_ms
    );

    let sorted_timeline = merge_timeline(sorted_traces)
        .into_iter()
        .cloned()
        .collect();

    let anomaly_report = AnomalyReport::assemble(
        diagnostics.corruption_reasons.keys().cloned().collect(),
        orphans.len(),
        diagnostics.clock_skew_events.len(),
        batch.malformed_ids.clone(),
    );

    Reconstruction {
        output: TimelineOutput {
            sorted_timeline,
            anomaly_report,
        },
        diagnostics,
    }
}

/// Write the output document, creating its parent directory if needed
pub fn write_output<P: AsRef<Path>>(output: &TimelineOutput, path: P, pretty: bool) -> Result<()> {
    let path = path.as_ref();
    let write_err = |source: std::io::Error| CausewayError::WriteOutput {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }

    let text = output
        .to_json(pretty)
        .map_err(CausewayError::SerializeOutput)?;
    fs::write(path, text).map_err(write_err)?;

    info!("Wrote output document to {}", path.display());
    Ok(())
}

/// Read the input document, reconstruct, and write the output document
pub fn run(config: &RunConfig) -> Result<Reconstruction> {
    config.validate()?;

    debug!("Reading input document {}", config.input_path.display());
    let input = InputDocument::from_file(&config.input_path)?;

    let reconstruction = reconstruct(&input);
    write_output(&reconstruction.output, &config.output_path, config.pretty)?;

    Ok(reconstruction)
}
