//! Disabled-state resolution.
//!
//! Combines per-node manual disables, the tag filter, node-kind disables,
//! active-pipeline membership, and modular-pipeline visibility into one
//! boolean per node; derives edge disabled state and the list of layers that
//! still own a visible node. Pure function of its inputs.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{Edge, LayerId, ModularPipelineId, NodeId, NodeKind, PipelineId, TagId};
use crate::state::LayerCatalog;

use super::working::{GraphWorkingSet, NodeOrigin};

/// The independently computed reasons a node is hidden.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisabledCauses {
    /// Hidden by an explicit user toggle.
    pub manual: bool,

    /// Hidden by the tag filter (see [`tag_filtered_out`]).
    pub tag: bool,

    /// Hidden because its node kind is disabled.
    pub kind: bool,

    /// Hidden because it is not a member of the active pipeline.
    pub pipeline: bool,

    /// Hidden by modular-pipeline visibility (group disabled, or a group
    /// pseudo-node whose pipeline is expanded).
    pub modular: bool,
}

impl DisabledCauses {
    /// Whether any cause applies.
    pub fn any(self) -> bool {
        self.manual || self.tag || self.kind || self.pipeline || self.modular
    }
}

/// Per-node and per-edge disabled state for one derivation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisabledState {
    nodes: BTreeMap<NodeId, DisabledCauses>,
    visible_layers: Vec<LayerId>,
}

impl DisabledState {
    /// Whether a node is disabled. Unknown ids count as disabled.
    pub fn node_disabled(&self, id: &NodeId) -> bool {
        self.nodes.get(id).is_none_or(|c| c.any())
    }

    /// The individual causes for a node, if it exists.
    pub fn causes(&self, id: &NodeId) -> Option<DisabledCauses> {
        self.nodes.get(id).copied()
    }

    /// An edge is disabled iff either endpoint is.
    pub fn edge_disabled(&self, edge: &Edge) -> bool {
        self.node_disabled(&edge.source) || self.node_disabled(&edge.target)
    }

    /// Layers that still own at least one visible node, in canonical order.
    pub fn visible_layers(&self) -> &[LayerId] {
        &self.visible_layers
    }
}

/// The tag filter is opt-in: it applies as soon as at least one tag is
/// enabled globally, and then keeps only nodes carrying at least one enabled
/// tag. A node with no tags at all is filtered out whenever any tag filter
/// is active. This surprising-but-deliberate policy must not be "fixed":
/// relaxing it would silently resurface untagged nodes under every filter.
pub(crate) fn tag_filtered_out(tags: &BTreeSet<TagId>, enabled_tags: &BTreeSet<TagId>) -> bool {
    if enabled_tags.is_empty() {
        return false;
    }
    !tags.iter().any(|t| enabled_tags.contains(t))
}

/// Resolve disabled state for every node of the working set.
#[allow(clippy::too_many_arguments)]
pub(crate) fn resolve(
    ws: &GraphWorkingSet,
    manual_disabled: &BTreeSet<NodeId>,
    enabled_tags: &BTreeSet<TagId>,
    disabled_kinds: &BTreeSet<NodeKind>,
    active_pipeline: Option<&PipelineId>,
    contracted: &BTreeSet<ModularPipelineId>,
    disabled_modular: &BTreeSet<ModularPipelineId>,
    layers: &LayerCatalog,
) -> DisabledState {
    let mut nodes = BTreeMap::new();
    for work in ws.nodes() {
        let node = &work.node;
        let modular = match &work.origin {
            NodeOrigin::Real => node
                .modular_pipelines
                .iter()
                .any(|mp| disabled_modular.contains(mp)),
            // A group pseudo-node stands in for its pipeline only while that
            // pipeline is contracted and fully enabled.
            NodeOrigin::Group(group) | NodeOrigin::Collapse(group) => {
                !contracted.contains(group)
                    || disabled_modular.contains(group)
                    || group.ancestors().iter().any(|a| disabled_modular.contains(a))
            }
        };
        let causes = DisabledCauses {
            manual: manual_disabled.contains(&node.id),
            tag: tag_filtered_out(&node.tags, enabled_tags),
            kind: disabled_kinds.contains(&node.kind),
            pipeline: active_pipeline.is_some_and(|p| !node.pipelines.contains(p)),
            modular,
        };
        nodes.insert(node.id.clone(), causes);
    }

    let visible_layers = layers
        .order()
        .iter()
        .filter(|layer| {
            ws.nodes().any(|work| {
                work.node.layer.as_ref() == Some(*layer)
                    && nodes.get(&work.node.id).is_some_and(|c| !c.any())
            })
        })
        .cloned()
        .collect();

    DisabledState { nodes, visible_layers }
}
