//! Causal graph construction and deterministic topological ordering
//!
//! Each complete trace becomes a small directed graph: one node per record,
//! and an edge `A -> B` whenever `B.causal_ref == A.id` and `A` belongs to the
//! same trace. References that leave the trace are ignored for ordering.
//!
//! # Ordering
//!
//! ```text
//!   s (clock 1) ──► p1 (clock 2) ──► e (clock 5)
//!        │
//!        └───────► p2 (clock 3)
//!
//!   ready: [s]          emit s   → p1, p2 become ready
//!   ready: [p1, p2]     emit p1  → e becomes ready (queued after p2)
//!   ready: [p2, e]      emit p2
//!   ready: [e]          emit e
//!
//!   order: s, p1, p2, e
//! ```
//!
//! Kahn's algorithm with a FIFO ready queue. The initial roots, and every
//! batch of records released by one emission, are sorted by
//! `(logical_clock, timestamp_ms)` before being queued, so causally
//! concurrent records come out in a reproducible order.
//!
//! Records on a trace-local cycle never reach zero in-degree. They are left
//! out of the order and returned separately as unresolved.

use crate::log_record::LogRecord;
use crate::trace_group::Trace;
use std::collections::{HashMap, VecDeque};

/// Index of a record inside its trace's graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Trace-local causal graph
///
/// Nodes are the trace's records in input order. When a trace holds the
/// same id twice, references resolve to the later record, matching the
/// global index.
#[derive(Debug, Clone)]
pub struct CausalGraph<'a> {
    nodes: Vec<&'a LogRecord>,
    /// Successors per node, in input order of the successor
    children: Vec<Vec<NodeId>>,
    /// Trace-local predecessor per node
    parents: Vec<Option<NodeId>>,
    roots: Vec<NodeId>,
    edge_count: usize,
}

/// Result of ordering one trace
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopologicalOrder<'a> {
    /// Records in causal order
    pub ordered: Vec<&'a LogRecord>,
    /// Records that could not be placed (trace-local cycle members and
    /// anything downstream of them), in input order
    pub unresolved: Vec<&'a LogRecord>,
}

impl<'a> TopologicalOrder<'a> {
    pub fn is_fully_resolved(&self) -> bool {
        self.unresolved.is_empty()
    }
}

impl<'a> CausalGraph<'a> {
    /// Build the graph for one trace
    pub fn from_trace(trace: &Trace<'a>) -> Self {
        Self::from_records(&trace.records)
    }

    /// Build the graph over an arbitrary record slice treated as one trace
    pub fn from_records(records: &[&'a LogRecord]) -> Self {
        let nodes: Vec<&'a LogRecord> = records.to_vec();

        let mut local: HashMap<&str, NodeId> = HashMap::with_capacity(nodes.len());
        for (idx, record) in nodes.iter().enumerate() {
            local.insert(record.id(), NodeId(idx));
        }

        let mut children = vec![Vec::new(); nodes.len()];
        let mut parents = vec![None; nodes.len()];
        let mut roots = Vec::new();
        let mut edge_count = 0;

        for (idx, record) in nodes.iter().enumerate() {
            let parent = record.causal_ref().and_then(|id| local.get(id).copied());
            match parent {
                Some(parent) => {
                    children[parent.0].push(NodeId(idx));
                    parents[idx] = Some(parent);
                    edge_count += 1;
                }
                None => roots.push(NodeId(idx)),
            }
        }

        Self {
            nodes,
            children,
            parents,
            roots,
            edge_count,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Nodes without a trace-local predecessor
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn record(&self, node: NodeId) -> Option<&'a LogRecord> {
        self.nodes.get(node.0).copied()
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.children.get(node.0).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.parents.get(node.0).copied().flatten()
    }

    /// Deterministic causal order of the trace's records
    pub fn topological_order(&self) -> TopologicalOrder<'a> {
        let mut in_degree: Vec<usize> = self
            .parents
            .iter()
            .map(|p| usize::from(p.is_some()))
            .collect();

        let mut initial = self.roots.clone();
        self.sort_concurrent(&mut initial);
        let mut ready: VecDeque<NodeId> = initial.into();

        let mut emitted = vec![false; self.nodes.len()];
        let mut ordered = Vec::with_capacity(self.nodes.len());

        while let Some(node) = ready.pop_front() {
            ordered.push(self.nodes[node.0]);
            emitted[node.0] = true;

            let mut released = Vec::new();
            for &child in self.children(node) {
                in_degree[child.0] -= 1;
                if in_degree[child.0] == 0 {
                    released.push(child);
                }
            }
            self.sort_concurrent(&mut released);
            ready.extend(released);
        }

        let unresolved: Vec<&'a LogRecord> = self
            .nodes
            .iter()
            .zip(&emitted)
            .filter(|(_, done)| !**done)
            .map(|(record, _)| *record)
            .collect();

        TopologicalOrder {
            ordered,
            unresolved,
        }
    }

    /// Stable sort by (logical_clock, timestamp_ms)
    fn sort_concurrent(&self, batch: &mut [NodeId]) {
        batch.sort_by(|a, b| self.nodes[a.0].cmp_concurrent(self.nodes[b.0]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::partition;
    use serde_json::{json, Value};

    fn rec(id: &str, clock: f64, ts: f64, causal_ref: Option<&str>) -> Value {
        json!({
            "id": id,
            "trace_id": "T",
            "node_id": "n",
            "event_type": "PROCESS",
            "timestamp_ms": ts,
            "logical_clock": clock,
            "payload": {},
            "causal_ref": causal_ref
        })
    }

    fn order_ids(raw: Vec<Value>) -> (Vec<String>, Vec<String>) {
        let batch = partition(&raw);
        let refs: Vec<&LogRecord> = batch.valid.iter().collect();
        let order = CausalGraph::from_records(&refs).topological_order();
        (
            order.ordered.iter().map(|r| r.id().to_string()).collect(),
            order.unresolved.iter().map(|r| r.id().to_string()).collect(),
        )
    }

    #[test]
    fn test_empty_graph() {
        let graph = CausalGraph::from_records(&[]);
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
        let order = graph.topological_order();
        assert!(order.ordered.is_empty());
        assert!(order.is_fully_resolved());
    }

    #[test]
    fn test_parent_child_edges() {
        let raw = vec![
            rec("s", 1.0, 10.0, None),
            rec("a", 2.0, 20.0, Some("s")),
            rec("b", 3.0, 30.0, Some("s")),
            rec("c", 4.0, 40.0, Some("a")),
        ];
        let batch = partition(&raw);
        let refs: Vec<&LogRecord> = batch.valid.iter().collect();
        let graph = CausalGraph::from_records(&refs);

        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.roots(), &[NodeId(0)]);
        assert_eq!(graph.children(NodeId(0)), &[NodeId(1), NodeId(2)]);
        assert_eq!(graph.parent(NodeId(3)), Some(NodeId(1)));
        assert_eq!(graph.record(NodeId(2)).map(|r| r.id()), Some("b"));
        assert!(graph.topological_order().is_fully_resolved());
    }

    #[test]
    fn test_chain_reversed_input() {
        let (ordered, unresolved) = order_ids(vec![
            rec("e", 3.0, 300.0, Some("p")),
            rec("p", 2.0, 200.0, Some("s")),
            rec("s", 1.0, 100.0, None),
        ]);
        assert_eq!(ordered, vec!["s", "p", "e"]);
        assert!(unresolved.is_empty());
    }

    #[test]
    fn test_causality_beats_logical_clock() {
        // successor carries a smaller clock than its predecessor
        let (ordered, _) = order_ids(vec![
            rec("child", 1.0, 100.0, Some("parent")),
            rec("parent", 9.0, 900.0, None),
        ]);
        assert_eq!(ordered, vec!["parent", "child"]);
    }

    #[test]
    fn test_concurrent_roots_by_clock_then_timestamp() {
        let (ordered, _) = order_ids(vec![
            rec("late", 2.0, 1.0, None),
            rec("tie_b", 1.0, 50.0, None),
            rec("tie_a", 1.0, 10.0, None),
        ]);
        assert_eq!(ordered, vec!["tie_a", "tie_b", "late"]);
    }

    #[test]
    fn test_released_batch_queued_after_existing_ready() {
        // p1 releases e; e waits behind p2 even with a smaller clock
        let (ordered, _) = order_ids(vec![
            rec("s", 1.0, 1.0, None),
            rec("p1", 2.0, 2.0, Some("s")),
            rec("p2", 9.0, 9.0, Some("s")),
            rec("e", 3.0, 3.0, Some("p1")),
        ]);
        assert_eq!(ordered, vec!["s", "p1", "p2", "e"]);
    }

    #[test]
    fn test_cross_trace_reference_treated_as_root() {
        let (ordered, _) = order_ids(vec![
            rec("b", 2.0, 2.0, Some("elsewhere")),
            rec("a", 1.0, 1.0, None),
        ]);
        assert_eq!(ordered, vec!["a", "b"]);
    }

    #[test]
    fn test_roots_ordered_exactly_beyond_f64_precision() {
        let big = |id: &str, clock: u64, causal_ref: Option<&str>| {
            json!({
                "id": id, "trace_id": "T", "node_id": "n", "event_type": "PROCESS",
                "timestamp_ms": 1000, "logical_clock": clock, "payload": {},
                "causal_ref": causal_ref
            })
        };
        let (ordered, _) = order_ids(vec![
            big("s", 0, None),
            big("b", 9_007_199_254_740_993, None),
            big("a", 9_007_199_254_740_992, None),
        ]);
        assert_eq!(ordered, vec!["s", "a", "b"]);
    }

    #[test]
    fn test_cycle_members_unresolved() {
        let (ordered, unresolved) = order_ids(vec![
            rec("s", 1.0, 1.0, None),
            rec("x", 2.0, 2.0, Some("y")),
            rec("y", 3.0, 3.0, Some("x")),
            rec("z", 4.0, 4.0, Some("y")),
        ]);
        assert_eq!(ordered, vec!["s"]);
        assert_eq!(unresolved, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_self_reference_unresolved() {
        let raw = vec![rec("loop", 1.0, 1.0, Some("loop"))];
        let batch = partition(&raw);
        let refs: Vec<&LogRecord> = batch.valid.iter().collect();
        let graph = CausalGraph::from_records(&refs);
        assert!(!graph.topological_order().is_fully_resolved());
        assert!(graph.roots().is_empty());
    }

    #[test]
    fn test_duplicate_id_resolves_to_later_record() {
        let raw = vec![
            rec("d", 5.0, 5.0, None),
            rec("d", 1.0, 1.0, None),
            rec("c", 0.0, 0.0, Some("d")),
        ];
        let batch = partition(&raw);
        let refs: Vec<&LogRecord> = batch.valid.iter().collect();
        let graph = CausalGraph::from_records(&refs);
        assert_eq!(graph.parent(NodeId(2)), Some(NodeId(1)));
        assert!(graph.children(NodeId(0)).is_empty());

        // c is released by the second "d" and queued behind the first
        let ids: Vec<f64> = graph
            .topological_order()
            .ordered
            .iter()
            .map(|r| r.logical_clock().as_f64())
            .collect();
        assert_eq!(ids, vec![1.0, 5.0, 0.0]);
    }
}
