//! Copy-on-write working set threaded between derivation stages.
//!
//! Earlier designs of this kind of engine mutate one shared node/edge
//! dictionary through recursive helpers; here every stage takes a working set
//! by reference and returns a new one, so later stages can never observe a
//! partially updated view.

use std::collections::BTreeMap;

use crate::domain::{Edge, EdgeId, ModularPipelineId, Node, NodeId};

/// Where a working node came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NodeOrigin {
    /// A node of the pipeline definition.
    Real,

    /// The canonical pseudo-node standing in for a modular pipeline.
    Group(ModularPipelineId),

    /// A bookkeeping node produced while collapsing a modular pipeline's
    /// internal edges. Never survives past the contraction stage.
    Collapse(ModularPipelineId),
}

/// A node in the working set, with its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WorkNode {
    /// The node record (real, or synthesized for a group).
    pub node: Node,

    /// Provenance of this node.
    pub origin: NodeOrigin,
}

impl WorkNode {
    /// Whether this node counts as a member of `mp` for contraction.
    ///
    /// The canonical pseudo-node of `a.b` is a member of ancestor `a` but not
    /// of `a.b` itself, so contracting `a.b` never consumes its own
    /// representative; collapse intermediates of `a.b` are members of `a.b`
    /// and of its ancestors.
    pub fn belongs_to(&self, mp: &ModularPipelineId) -> bool {
        match &self.origin {
            NodeOrigin::Real => self.node.modular_pipelines.contains(mp),
            NodeOrigin::Group(group) => mp.contains(group),
            NodeOrigin::Collapse(group) => group == mp || mp.contains(group),
        }
    }
}

/// The node/edge universe a derivation stage operates on.
///
/// `BTreeMap` arenas keyed by id give deterministic iteration, duplicate
/// edges collapse on insertion, and edges never reference absent nodes:
/// an edge whose endpoint is missing at insertion time is dropped, and
/// removing a node removes its incident edges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct GraphWorkingSet {
    nodes: BTreeMap<NodeId, WorkNode>,
    edges: BTreeMap<EdgeId, Edge>,
}

impl GraphWorkingSet {
    /// Insert a node, replacing any node with the same id.
    pub fn insert_node(&mut self, node: WorkNode) {
        self.nodes.insert(node.node.id.clone(), node);
    }

    /// Insert an edge between existing nodes.
    ///
    /// Returns `false` when the edge is dropped: a self-loop, or an endpoint
    /// that does not resolve to a node in this working set.
    pub fn insert_edge(&mut self, source: NodeId, target: NodeId) -> bool {
        if source == target {
            return false;
        }
        if !self.nodes.contains_key(&source) || !self.nodes.contains_key(&target) {
            tracing::debug!(%source, %target, "dropped edge with missing endpoint");
            return false;
        }
        let edge = Edge::new(source, target);
        self.edges.insert(edge.id.clone(), edge);
        true
    }

    /// Remove a node and every edge touching it.
    pub fn remove_node(&mut self, id: &NodeId) -> Option<WorkNode> {
        let removed = self.nodes.remove(id)?;
        self.edges.retain(|_, e| e.source != *id && e.target != *id);
        Some(removed)
    }

    /// Remove an edge by id.
    pub fn remove_edge(&mut self, id: &EdgeId) -> Option<Edge> {
        self.edges.remove(id)
    }

    /// Look up a node.
    pub fn node(&self, id: &NodeId) -> Option<&WorkNode> {
        self.nodes.get(id)
    }

    /// Whether a node exists.
    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Iterate nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &WorkNode> {
        self.nodes.values()
    }

    /// Iterate edges in id order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Ids of edges incident to a node.
    pub fn edges_touching(&self, id: &NodeId) -> Vec<EdgeId> {
        self.edges
            .values()
            .filter(|e| e.source == *id || e.target == *id)
            .map(|e| e.id.clone())
            .collect()
    }
}
