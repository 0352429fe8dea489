//! Modular-pipeline aggregation.
//!
//! Computes the flat membership index (modular pipeline id → every node
//! directly or transitively contained) and builds the combined universe:
//! real nodes and edges, one canonical pseudo-node per non-empty modular
//! pipeline, and boundary pseudo-edges linking each pseudo-node to the nodes
//! just outside its group. Edges internal to a group are left alone here;
//! rewriting them is the contraction engine's job.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{ModularPipelineId, Node, NodeId, NodeKind};
use crate::state::{EdgeCatalog, ModularCatalog, NodeCatalog};

use super::working::{GraphWorkingSet, NodeOrigin, WorkNode};

/// Flat membership index: which node ids does each modular pipeline contain,
/// directly or through nested groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Membership {
    members: BTreeMap<ModularPipelineId, BTreeSet<NodeId>>,
}

impl Membership {
    /// Member node ids of a modular pipeline.
    pub fn members(&self, mp: &ModularPipelineId) -> Option<&BTreeSet<NodeId>> {
        self.members.get(mp)
    }

    /// Whether `node` is contained in `mp`.
    pub fn contains(&self, mp: &ModularPipelineId, node: &NodeId) -> bool {
        self.members.get(mp).is_some_and(|m| m.contains(node))
    }
}

/// Build the flat membership index from node membership lists.
pub(crate) fn membership_index(nodes: &NodeCatalog, modular: &ModularCatalog) -> Membership {
    let mut members: BTreeMap<ModularPipelineId, BTreeSet<NodeId>> = BTreeMap::new();
    for mp in modular.iter() {
        members.entry(mp.id.clone()).or_default();
    }
    for node in nodes.iter() {
        for mp in &node.modular_pipelines {
            members.entry(mp.clone()).or_default().insert(node.id.clone());
        }
    }
    Membership { members }
}

/// Build the combined node/edge universe prior to disabling.
pub(crate) fn build_universe(
    nodes: &NodeCatalog,
    edges: &EdgeCatalog,
    modular: &ModularCatalog,
    membership: &Membership,
) -> GraphWorkingSet {
    let mut ws = GraphWorkingSet::default();

    for node in nodes.iter() {
        ws.insert_node(WorkNode { node: node.clone(), origin: NodeOrigin::Real });
    }

    // One canonical pseudo-node per non-empty modular pipeline. Its tags and
    // registered-pipeline memberships are the union of its members', so the
    // tag and active-pipeline filters treat the group like its contents.
    for mp in modular.iter() {
        let Some(member_ids) = membership.members(&mp.id).filter(|m| !m.is_empty()) else {
            continue;
        };
        let group_id = NodeId::new(mp.id.as_str());
        if nodes.contains(&group_id) {
            tracing::warn!(id = %group_id, "modular pipeline id collides with a node id; group node skipped");
            continue;
        }

        let mut tags = BTreeSet::new();
        let mut pipelines = BTreeSet::new();
        for member in member_ids {
            if let Some(node) = nodes.get(member) {
                tags.extend(node.tags.iter().cloned());
                pipelines.extend(node.pipelines.iter().cloned());
            }
        }

        ws.insert_node(WorkNode {
            node: Node {
                id: group_id,
                name: mp.name.clone(),
                kind: NodeKind::Pipeline,
                layer: None,
                tags,
                pipelines,
                modular_pipelines: mp.id.ancestors(),
            },
            origin: NodeOrigin::Group(mp.id.clone()),
        });
    }

    for edge in edges.iter() {
        ws.insert_edge(edge.source.clone(), edge.target.clone());
    }

    // Boundary pseudo-edges: a real edge crossing a group boundary also links
    // the group's pseudo-node to the outside endpoint, direction preserved.
    let mut synthesized = 0usize;
    for edge in edges.iter() {
        for mp in modular.iter() {
            let group_id = NodeId::new(mp.id.as_str());
            if !ws.contains_node(&group_id) {
                continue;
            }
            let source_in = membership.contains(&mp.id, &edge.source);
            let target_in = membership.contains(&mp.id, &edge.target);
            let added = match (source_in, target_in) {
                (false, true) => ws.insert_edge(edge.source.clone(), group_id),
                (true, false) => ws.insert_edge(group_id, edge.target.clone()),
                _ => false,
            };
            if added {
                synthesized += 1;
            }
        }
    }
    tracing::debug!(
        nodes = ws.node_count(),
        edges = ws.edge_count(),
        boundary_edges = synthesized,
        "aggregated modular-pipeline universe"
    );

    ws
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EdgeId;
    use crate::state::{EdgeDef, NodeDef, PipelineDefinition, PipelineState};

    fn state_with(nodes: Vec<(&str, Vec<&str>)>, edges: Vec<(&str, &str)>) -> PipelineState {
        PipelineState::from_definition(PipelineDefinition {
            nodes: nodes
                .into_iter()
                .map(|(id, mps)| NodeDef {
                    id: id.to_string(),
                    name: None,
                    kind: NodeKind::Task,
                    layer: None,
                    tags: Vec::new(),
                    pipelines: Vec::new(),
                    modular_pipelines: mps.into_iter().map(str::to_string).collect(),
                })
                .collect(),
            edges: edges
                .into_iter()
                .map(|(s, t)| EdgeDef { source: s.to_string(), target: t.to_string() })
                .collect(),
            ..PipelineDefinition::default()
        })
    }

    #[test]
    fn membership_is_transitive_through_nesting() {
        let state = state_with(vec![("x", vec!["a.b"]), ("y", vec!["a"])], vec![]);
        let index = membership_index(state.nodes(), state.modular_pipelines());

        let a = ModularPipelineId::new("a");
        let ab = ModularPipelineId::new("a.b");
        assert!(index.contains(&a, &NodeId::new("x")));
        assert!(index.contains(&a, &NodeId::new("y")));
        assert!(index.contains(&ab, &NodeId::new("x")));
        assert!(!index.contains(&ab, &NodeId::new("y")));
    }

    #[test]
    fn boundary_edges_link_the_group_node_to_the_outside() {
        let state = state_with(
            vec![("w", vec![]), ("x", vec!["p"]), ("y", vec!["p"]), ("z", vec![])],
            vec![("w", "x"), ("x", "y"), ("y", "z")],
        );
        let index = membership_index(state.nodes(), state.modular_pipelines());
        let ws = build_universe(state.nodes(), state.edges(), state.modular_pipelines(), &index);

        assert!(ws.contains_node(&NodeId::new("p")));
        let edge_ids: Vec<&str> = ws.edges().map(|e| e.id.as_str()).collect();
        assert!(edge_ids.contains(&"w|p"));
        assert!(edge_ids.contains(&"p|z"));
        // The internal edge is untouched here.
        assert!(edge_ids.contains(&"x|y"));
        // No pseudo-edge duplicates the group's internal connectivity.
        assert!(!edge_ids.contains(&"p|p"));
    }

    #[test]
    fn empty_groups_produce_no_pseudo_node() {
        let state = PipelineState::from_definition(PipelineDefinition {
            nodes: vec![NodeDef {
                id: "n".to_string(),
                name: None,
                kind: NodeKind::Task,
                layer: None,
                tags: Vec::new(),
                pipelines: Vec::new(),
                modular_pipelines: Vec::new(),
            }],
            modular_pipelines: vec![crate::state::ModularPipelineDef {
                id: "empty".to_string(),
                name: None,
            }],
            ..PipelineDefinition::default()
        });
        let index = membership_index(state.nodes(), state.modular_pipelines());
        let ws = build_universe(state.nodes(), state.edges(), state.modular_pipelines(), &index);

        assert!(!ws.contains_node(&NodeId::new("empty")));
        assert_eq!(ws.node_count(), 1);
    }

    #[test]
    fn nested_groups_each_get_boundary_edges() {
        let state = state_with(
            vec![("w", vec![]), ("x", vec!["a.b"]), ("z", vec![])],
            vec![("w", "x"), ("x", "z")],
        );
        let index = membership_index(state.nodes(), state.modular_pipelines());
        let ws = build_universe(state.nodes(), state.edges(), state.modular_pipelines(), &index);

        for group in ["a", "a.b"] {
            let group = NodeId::new(group);
            assert!(ws.contains_node(&group), "missing group {group}");
            assert!(ws.edges().any(|e| e.id == EdgeId::of(&NodeId::new("w"), &group)));
            assert!(ws.edges().any(|e| e.id == EdgeId::of(&group, &NodeId::new("z"))));
        }
    }
}
