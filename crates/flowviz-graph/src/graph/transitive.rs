//! Transitive-edge synthesis.
//!
//! Hiding a node must not disconnect the visible graph: any chain of
//! disabled nodes between two enabled ones is replaced by a direct bridging
//! edge. Walks are seeded only from enabled sources (a path ending at an
//! enabled terminus can never itself be transitive from the other side) and
//! only continue through disabled *real* nodes; disabled group pseudo-nodes
//! are dead ends, since an expanded group is already represented by its
//! members and bridging through it would fabricate shortcuts.

use std::collections::{BTreeMap, HashSet};

use crate::domain::{Edge, EdgeId, NodeId};

use super::working::{GraphWorkingSet, NodeOrigin};
use super::DisabledState;

/// Minimum number of nodes on an accumulated walk before a bridge is
/// emitted. Three nodes means at least one disabled node was skipped;
/// loosening this would duplicate real edges between adjacent enabled
/// nodes.
const MIN_BRIDGE_PATH_NODES: usize = 3;

/// Synthesize bridging edges across chains of disabled nodes.
///
/// Returns only the new edges; the caller merges them into the visible set.
/// Duplicates (a bridge that coincides with a real edge, or the same bridge
/// reached along two chains) collapse by composite id.
pub(crate) fn bridge_edges(ws: &GraphWorkingSet, disabled: &DisabledState) -> Vec<Edge> {
    // Outgoing adjacency, excluding edges into disabled pseudo-nodes.
    let mut outgoing: BTreeMap<&NodeId, Vec<&NodeId>> = BTreeMap::new();
    for edge in ws.edges() {
        if walkable(ws, disabled, &edge.source) && walkable(ws, disabled, &edge.target) {
            outgoing.entry(&edge.source).or_default().push(&edge.target);
        }
    }

    let mut bridges: BTreeMap<EdgeId, Edge> = BTreeMap::new();
    for work in ws.nodes() {
        let source = &work.node.id;
        if disabled.node_disabled(source) {
            continue;
        }

        // Depth-first through disabled nodes only, tracking how many nodes
        // the accumulated walk spans. Stack entries carry the walk length up
        // to and including the skipped node.
        let mut stack: Vec<(&NodeId, usize)> = Vec::new();
        let mut visited: HashSet<&NodeId> = HashSet::new();
        for &target in outgoing.get(source).into_iter().flatten() {
            if disabled.node_disabled(target) && visited.insert(target) {
                stack.push((target, 2));
            }
        }
        while let Some((skipped, length)) = stack.pop() {
            for &target in outgoing.get(skipped).into_iter().flatten() {
                if !disabled.node_disabled(target) {
                    if length + 1 >= MIN_BRIDGE_PATH_NODES && target != source {
                        let edge = Edge::new(source.clone(), target.clone());
                        bridges.entry(edge.id.clone()).or_insert(edge);
                    }
                } else if visited.insert(target) {
                    stack.push((target, length + 1));
                }
            }
        }
    }

    if !bridges.is_empty() {
        tracing::debug!(count = bridges.len(), "synthesized transitive edges");
    }
    bridges.into_values().collect()
}

fn walkable(ws: &GraphWorkingSet, disabled: &DisabledState, id: &NodeId) -> bool {
    match ws.node(id).map(|n| &n.origin) {
        Some(NodeOrigin::Real) => true,
        Some(NodeOrigin::Group(_) | NodeOrigin::Collapse(_)) => !disabled.node_disabled(id),
        None => false,
    }
}
