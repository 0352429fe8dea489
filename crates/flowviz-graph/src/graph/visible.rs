//! The visible graph handed to rank, slice, and linked-node traversals.
//!
//! Materializes the filtered universe as ordered node/edge lists plus a
//! petgraph `DiGraph` with an id-to-index map, so downstream algorithms can
//! traverse both directions without rebuilding adjacency.

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::domain::{Edge, EdgeId, NodeId, VisibleNode};

use super::transitive::bridge_edges;
use super::working::GraphWorkingSet;
use super::DisabledState;

/// The visible node/edge set of one derivation pass.
///
/// Invariant: every edge's source and target resolve to a visible node.
#[derive(Debug)]
pub struct VisibleGraph {
    nodes: Vec<VisibleNode>,
    edges: Vec<Edge>,
    graph: DiGraph<NodeId, EdgeId>,
    node_map: HashMap<NodeId, NodeIndex>,
}

impl VisibleGraph {
    /// Filter the working set down to enabled nodes and edges, merge in the
    /// synthesized transitive bridges, and build the traversal index.
    pub(crate) fn build(ws: &GraphWorkingSet, disabled: &DisabledState) -> Self {
        let mut graph = DiGraph::new();
        let mut node_map = HashMap::new();
        let mut nodes = Vec::new();

        for work in ws.nodes() {
            if disabled.node_disabled(&work.node.id) {
                continue;
            }
            let index = graph.add_node(work.node.id.clone());
            node_map.insert(work.node.id.clone(), index);
            nodes.push(VisibleNode::from_node(&work.node));
        }

        let mut edges: Vec<Edge> = ws
            .edges()
            .filter(|&e| !disabled.edge_disabled(e))
            .cloned()
            .collect();
        for bridge in bridge_edges(ws, disabled) {
            // A bridge can coincide with a surviving real edge by id.
            if !edges.iter().any(|e| e.id == bridge.id) {
                edges.push(bridge);
            }
        }
        edges.sort_by(|a, b| a.id.cmp(&b.id));

        for edge in &edges {
            let (Some(&source), Some(&target)) =
                (node_map.get(&edge.source), node_map.get(&edge.target))
            else {
                // Cannot happen: edge_disabled covers unknown endpoints.
                continue;
            };
            graph.add_edge(source, target, edge.id.clone());
        }

        tracing::debug!(nodes = nodes.len(), edges = edges.len(), "built visible graph");
        Self { nodes, edges, graph, node_map }
    }

    /// Visible nodes in id order.
    pub fn nodes(&self) -> &[VisibleNode] {
        &self.nodes
    }

    /// Visible edges in id order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Whether a node is visible.
    pub fn contains(&self, id: &NodeId) -> bool {
        self.node_map.contains_key(id)
    }

    /// Direct successors of a node, in id order.
    pub fn successors(&self, id: &NodeId) -> Vec<NodeId> {
        self.neighbors(id, Direction::Outgoing)
    }

    /// Direct predecessors of a node, in id order.
    pub fn predecessors(&self, id: &NodeId) -> Vec<NodeId> {
        self.neighbors(id, Direction::Incoming)
    }

    fn neighbors(&self, id: &NodeId, direction: Direction) -> Vec<NodeId> {
        let Some(&index) = self.node_map.get(id) else {
            return Vec::new();
        };
        let mut out: Vec<NodeId> = self
            .graph
            .neighbors_directed(index, direction)
            .map(|n| self.graph[n].clone())
            .collect();
        out.sort();
        out.dedup();
        out
    }

    pub(crate) fn petgraph(&self) -> &DiGraph<NodeId, EdgeId> {
        &self.graph
    }

    pub(crate) fn node_index(&self, id: &NodeId) -> Option<NodeIndex> {
        self.node_map.get(id).copied()
    }
}
