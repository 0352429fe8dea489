//! Rank and layer-band assignment.
//!
//! Visible nodes are grouped by layer in canonical order, a dependency map
//! is built from visible edges plus synthetic "every node of layer i
//! precedes every node of layer i+1" constraints, and a batching topological
//! sort assigns each extraction round one rank. Batching (rather than a
//! DFS-order toposort) is what makes nodes land in the earliest rank their
//! dependencies allow, which layer banding relies on.

use std::collections::{BTreeMap, HashMap};

use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;

use crate::domain::{LayerBand, LayerId, NodeId};
use crate::error::{Error, Result};
use crate::state::LayerCatalog;

use super::visible::VisibleGraph;

/// Compute one rank per visible node.
///
/// Returns an empty map when layering is hidden or no visible node belongs
/// to a layer. A cycle in the dependency map is a fatal input-validation
/// failure: the batching sort stalls, and the unranked residue is returned
/// as [`Error::CyclicDependencies`].
pub(crate) fn assign_ranks(
    visible: &VisibleGraph,
    layers: &LayerCatalog,
    layers_visible: bool,
) -> Result<BTreeMap<NodeId, usize>> {
    if !layers_visible || layers.is_empty() {
        return Ok(BTreeMap::new());
    }

    let graph = visible.petgraph();

    // Non-empty layer groups in canonical order.
    let mut group_of: HashMap<NodeIndex, usize> = HashMap::new();
    let mut groups: Vec<Vec<NodeIndex>> = Vec::new();
    for layer in layers.order() {
        let members: Vec<NodeIndex> = visible
            .nodes()
            .iter()
            .filter(|n| n.layer.as_ref() == Some(layer))
            .filter_map(|n| visible.node_index(&n.id))
            .collect();
        if members.is_empty() {
            continue;
        }
        for &index in &members {
            group_of.insert(index, groups.len());
        }
        groups.push(members);
    }
    if groups.is_empty() {
        return Ok(BTreeMap::new());
    }

    // In-degrees over real edges plus the synthetic inter-layer constraints.
    let mut in_degree: Vec<usize> = vec![0; graph.node_count()];
    for edge in graph.edge_references() {
        in_degree[edge.target().index()] += 1;
    }
    for pair in groups.windows(2) {
        for &target in &pair[1] {
            in_degree[target.index()] += pair[0].len();
        }
    }

    let mut ranks = BTreeMap::new();
    let mut current: Vec<NodeIndex> = graph
        .node_indices()
        .filter(|n| in_degree[n.index()] == 0)
        .collect();
    let mut rank = 0usize;
    let mut ranked = 0usize;

    while !current.is_empty() {
        let mut next = Vec::new();
        for &node in &current {
            ranks.insert(graph[node].clone(), rank);
            ranked += 1;

            for edge in graph.edges(node) {
                let target = edge.target();
                in_degree[target.index()] -= 1;
                if in_degree[target.index()] == 0 {
                    next.push(target);
                }
            }
            if let Some(&group) = group_of.get(&node) {
                if let Some(successors) = groups.get(group + 1) {
                    for &target in successors {
                        in_degree[target.index()] -= 1;
                        if in_degree[target.index()] == 0 {
                            next.push(target);
                        }
                    }
                }
            }
        }
        rank += 1;
        current = next;
    }

    if ranked < graph.node_count() {
        let mut residue: Vec<NodeId> = graph
            .node_indices()
            .filter(|n| !ranks.contains_key(&graph[*n]))
            .map(|n| graph[n].clone())
            .collect();
        residue.sort();
        return Err(Error::CyclicDependencies { nodes: residue });
    }

    tracing::debug!(ranks = ranks.len(), batches = rank, "assigned node ranks");
    Ok(ranks)
}

/// Project the visible layers into ordered band objects.
pub(crate) fn layer_bands(
    visible_layers: &[LayerId],
    layers: &LayerCatalog,
    layers_visible: bool,
) -> Vec<LayerBand> {
    if !layers_visible {
        return Vec::new();
    }
    visible_layers
        .iter()
        .filter_map(|id| {
            layers.position(id).map(|order| LayerBand {
                id: id.clone(),
                name: layers.name(id).to_string(),
                order,
            })
        })
        .collect()
}
