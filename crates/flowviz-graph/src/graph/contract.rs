//! Hierarchical contraction of modular pipelines.
//!
//! A contracted modular pipeline is collapsed into a single pseudo-node in
//! two steps, per pipeline:
//!
//! 1. Recursively collapse internal edges. An edge whose endpoints both
//!    belong to the pipeline (member nodes, or pseudo-nodes already created
//!    for this same pipeline) is consumed: both endpoints are deleted, one
//!    representative node takes their place, and every edge that touched
//!    either endpoint is redirected to it. Each iteration removes two nodes
//!    and adds one, so the loop terminates.
//! 2. Replace remaining members with the canonical group node (id = the
//!    modular pipeline id), redirecting edges identically. Duplicate edge
//!    ids merge; self-loops produced by redirection are dropped.
//!
//! Contraction of one pipeline affects siblings and ancestors only through
//! redirection, and re-contracting an already-collapsed pipeline is a no-op.

use std::collections::BTreeSet;

use crate::domain::{ModularPipelineId, Node, NodeId, NodeKind};
use crate::state::ModularCatalog;

use super::working::{GraphWorkingSet, NodeOrigin, WorkNode};

/// Apply contraction for every contracted, enabled modular pipeline.
///
/// Pipelines are processed in id order, so an ancestor is contracted before
/// its nested pipelines; whatever the nesting, the outermost contracted
/// pipeline ends up as the single surviving representative. A pipeline whose
/// self or ancestor is disabled is skipped: its members stay in the universe
/// as individually disabled nodes, which keeps transitive bridging able to
/// preserve connectivity around them.
pub(crate) fn contract_pipelines(
    universe: &GraphWorkingSet,
    modular: &ModularCatalog,
    contracted: &BTreeSet<ModularPipelineId>,
    disabled_modular: &BTreeSet<ModularPipelineId>,
) -> GraphWorkingSet {
    let mut ws = universe.clone();
    for mp in contracted {
        let Some(pipeline) = modular.get(mp) else {
            tracing::warn!(pipeline = %mp, "contracted id does not name a modular pipeline");
            continue;
        };
        let self_or_ancestor_disabled = disabled_modular.contains(mp)
            || mp.ancestors().iter().any(|a| disabled_modular.contains(a));
        if self_or_ancestor_disabled {
            continue;
        }
        contract_one(&mut ws, &pipeline.id, &pipeline.name);
    }
    ws
}

fn contract_one(ws: &mut GraphWorkingSet, mp: &ModularPipelineId, name: &str) {
    let before = ws.node_count();

    // Step 1: collapse internal edges until none remain.
    while let Some(edge) = internal_edge(ws, mp) {
        let Some(consumed) = ws.remove_edge(&edge) else { break };
        let rep_id = NodeId::new(format!("{}-{}", mp, consumed.id));

        let mut tags = BTreeSet::new();
        let mut pipelines = BTreeSet::new();
        for endpoint in [&consumed.source, &consumed.target] {
            if let Some(n) = ws.node(endpoint) {
                tags.extend(n.node.tags.iter().cloned());
                pipelines.extend(n.node.pipelines.iter().cloned());
            }
        }
        ws.insert_node(WorkNode {
            node: Node {
                id: rep_id.clone(),
                name: name.to_string(),
                kind: NodeKind::Pipeline,
                layer: None,
                tags,
                pipelines,
                modular_pipelines: mp.ancestors(),
            },
            origin: NodeOrigin::Collapse(mp.clone()),
        });

        redirect_edges(ws, &consumed.source, &rep_id);
        redirect_edges(ws, &consumed.target, &rep_id);
        ws.remove_node(&consumed.source);
        ws.remove_node(&consumed.target);
    }

    // Step 2: replace surviving members with the canonical group node.
    let members: Vec<NodeId> = ws
        .nodes()
        .filter(|n| n.belongs_to(mp))
        .map(|n| n.node.id.clone())
        .collect();
    if members.is_empty() {
        return;
    }

    let group_id = NodeId::new(mp.as_str());
    if !ws.contains_node(&group_id) {
        let mut tags = BTreeSet::new();
        let mut pipelines = BTreeSet::new();
        for member in &members {
            if let Some(n) = ws.node(member) {
                tags.extend(n.node.tags.iter().cloned());
                pipelines.extend(n.node.pipelines.iter().cloned());
            }
        }
        ws.insert_node(WorkNode {
            node: Node {
                id: group_id.clone(),
                name: name.to_string(),
                kind: NodeKind::Pipeline,
                layer: None,
                tags,
                pipelines,
                modular_pipelines: mp.ancestors(),
            },
            origin: NodeOrigin::Group(mp.clone()),
        });
    }

    for member in &members {
        redirect_edges(ws, member, &group_id);
        ws.remove_node(member);
    }

    tracing::debug!(
        pipeline = %mp,
        consumed = before.saturating_sub(ws.node_count()),
        "contracted modular pipeline"
    );
}

/// First edge (in id order) whose endpoints both belong to `mp`.
fn internal_edge(ws: &GraphWorkingSet, mp: &ModularPipelineId) -> Option<crate::domain::EdgeId> {
    ws.edges()
        .find(|e| {
            let source_in = ws.node(&e.source).is_some_and(|n| n.belongs_to(mp));
            let target_in = ws.node(&e.target).is_some_and(|n| n.belongs_to(mp));
            source_in && target_in
        })
        .map(|e| e.id.clone())
}

/// Re-point every edge touching `from` at `to`. Redirection that would
/// produce a self-loop or a duplicate id drops the edge instead.
fn redirect_edges(ws: &mut GraphWorkingSet, from: &NodeId, to: &NodeId) {
    for edge_id in ws.edges_touching(from) {
        let Some(edge) = ws.remove_edge(&edge_id) else { continue };
        let source = if edge.source == *from { to.clone() } else { edge.source };
        let target = if edge.target == *from { to.clone() } else { edge.target };
        ws.insert_edge(source, target);
    }
}
