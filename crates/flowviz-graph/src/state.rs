//! Normalized pipeline state and the serde-facing definition format.
//!
//! [`PipelineState`] is the single input of the derivation chain. Each
//! concern lives in its own `Arc`-held slice so the memoization layer can key
//! stage caches on slice identity: a mutator replaces exactly the one slice
//! it touches with a freshly allocated `Arc`, and every stage whose declared
//! inputs kept their identity keeps its cache.
//!
//! [`PipelineDefinition`] is the on-disk shape (arrays of node/edge/tag/
//! layer/modular-pipeline objects). Normalization drops records with missing
//! references instead of failing, logging each drop.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::domain::{
    Edge, EdgeId, LayerId, ModularPipeline, ModularPipelineId, Node, NodeId, NodeKind, PipelineId,
    SliceSelection, Tag, TagId,
};

// ---------------------------------------------------------------------------
// Catalogs: the immutable definition part of the state
// ---------------------------------------------------------------------------

/// All nodes of the pipeline definition, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeCatalog {
    nodes: BTreeMap<NodeId, Node>,
}

impl NodeCatalog {
    /// Look up a node by id.
    pub fn get(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Whether a node with this id exists.
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Iterate all nodes in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// All real edges of the pipeline definition, keyed by composite id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeCatalog {
    edges: BTreeMap<EdgeId, Edge>,
}

impl EdgeCatalog {
    /// Iterate all edges in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Number of edges.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// All tags, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagCatalog {
    tags: BTreeMap<TagId, Tag>,
}

impl TagCatalog {
    /// Look up a tag by id.
    pub fn get(&self, id: &TagId) -> Option<&Tag> {
        self.tags.get(id)
    }

    /// Iterate all tags in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.tags.values()
    }

    /// Whether a tag with this id exists.
    pub fn contains(&self, id: &TagId) -> bool {
        self.tags.contains_key(id)
    }
}

/// All modular pipelines, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModularCatalog {
    pipelines: BTreeMap<ModularPipelineId, ModularPipeline>,
}

impl ModularCatalog {
    /// Look up a modular pipeline by id.
    pub fn get(&self, id: &ModularPipelineId) -> Option<&ModularPipeline> {
        self.pipelines.get(id)
    }

    /// Iterate all modular pipelines in id order (parents before children).
    pub fn iter(&self) -> impl Iterator<Item = &ModularPipeline> {
        self.pipelines.values()
    }

    /// Whether a modular pipeline with this id exists.
    pub fn contains(&self, id: &ModularPipelineId) -> bool {
        self.pipelines.contains_key(id)
    }
}

/// The canonical layer sequence and display names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerCatalog {
    order: Vec<LayerId>,
    names: BTreeMap<LayerId, String>,
}

impl LayerCatalog {
    /// The canonical layer order.
    pub fn order(&self) -> &[LayerId] {
        &self.order
    }

    /// Position of a layer in the canonical sequence.
    pub fn position(&self, id: &LayerId) -> Option<usize> {
        self.order.iter().position(|l| l == id)
    }

    /// Display name of a layer, falling back to its id.
    pub fn name<'a>(&'a self, id: &'a LayerId) -> &'a str {
        self.names.get(id).map_or(id.as_str(), String::as_str)
    }

    /// Whether no layers are defined.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

// ---------------------------------------------------------------------------
// PipelineState
// ---------------------------------------------------------------------------

/// The normalized pipeline plus interactive view state.
///
/// Construction goes through [`PipelineState::from_definition`]; interactive
/// toggles go through the `set_*` mutators, each of which replaces exactly
/// one state slice.
#[derive(Debug, Clone)]
pub struct PipelineState {
    nodes: Arc<NodeCatalog>,
    edges: Arc<EdgeCatalog>,
    tags: Arc<TagCatalog>,
    modular: Arc<ModularCatalog>,
    layers: Arc<LayerCatalog>,

    manual_disabled: Arc<BTreeSet<NodeId>>,
    enabled_tags: Arc<BTreeSet<TagId>>,
    active_tags: Arc<BTreeSet<TagId>>,
    disabled_kinds: Arc<BTreeSet<NodeKind>>,
    contracted: Arc<BTreeSet<ModularPipelineId>>,
    disabled_modular: Arc<BTreeSet<ModularPipelineId>>,

    active_pipeline: Option<PipelineId>,
    layers_visible: bool,
    slice: SliceSelection,
    focused: Option<NodeId>,
}

impl PipelineState {
    /// The node catalog.
    pub fn nodes(&self) -> &NodeCatalog {
        &self.nodes
    }

    /// The edge catalog.
    pub fn edges(&self) -> &EdgeCatalog {
        &self.edges
    }

    /// The tag catalog.
    pub fn tags(&self) -> &TagCatalog {
        &self.tags
    }

    /// The modular pipeline catalog.
    pub fn modular_pipelines(&self) -> &ModularCatalog {
        &self.modular
    }

    /// The layer catalog.
    pub fn layers(&self) -> &LayerCatalog {
        &self.layers
    }

    /// Manually disabled node ids.
    pub fn manual_disabled(&self) -> &BTreeSet<NodeId> {
        &self.manual_disabled
    }

    /// Enabled tag filters. An empty set means no tag filtering is active.
    pub fn enabled_tags(&self) -> &BTreeSet<TagId> {
        &self.enabled_tags
    }

    /// Hover-highlighted tags. Never an input to any derivation stage.
    pub fn active_tags(&self) -> &BTreeSet<TagId> {
        &self.active_tags
    }

    /// Disabled node kinds.
    pub fn disabled_kinds(&self) -> &BTreeSet<NodeKind> {
        &self.disabled_kinds
    }

    /// Contracted modular pipeline ids.
    pub fn contracted(&self) -> &BTreeSet<ModularPipelineId> {
        &self.contracted
    }

    /// Disabled (not-enabled) modular pipeline ids.
    pub fn disabled_modular(&self) -> &BTreeSet<ModularPipelineId> {
        &self.disabled_modular
    }

    /// The active registered pipeline, if one is selected.
    pub fn active_pipeline(&self) -> Option<&PipelineId> {
        self.active_pipeline.as_ref()
    }

    /// Whether layer bands (and ranks) are shown.
    pub fn layers_visible(&self) -> bool {
        self.layers_visible
    }

    /// The current slice selection.
    pub fn slice(&self) -> &SliceSelection {
        &self.slice
    }

    /// The focused node for linked-node highlighting.
    pub fn focused(&self) -> Option<&NodeId> {
        self.focused.as_ref()
    }

    pub(crate) fn nodes_slice(&self) -> &Arc<NodeCatalog> {
        &self.nodes
    }

    pub(crate) fn edges_slice(&self) -> &Arc<EdgeCatalog> {
        &self.edges
    }

    pub(crate) fn modular_slice(&self) -> &Arc<ModularCatalog> {
        &self.modular
    }

    pub(crate) fn layers_slice(&self) -> &Arc<LayerCatalog> {
        &self.layers
    }

    pub(crate) fn manual_disabled_slice(&self) -> &Arc<BTreeSet<NodeId>> {
        &self.manual_disabled
    }

    pub(crate) fn enabled_tags_slice(&self) -> &Arc<BTreeSet<TagId>> {
        &self.enabled_tags
    }

    pub(crate) fn disabled_kinds_slice(&self) -> &Arc<BTreeSet<NodeKind>> {
        &self.disabled_kinds
    }

    pub(crate) fn contracted_slice(&self) -> &Arc<BTreeSet<ModularPipelineId>> {
        &self.contracted
    }

    pub(crate) fn disabled_modular_slice(&self) -> &Arc<BTreeSet<ModularPipelineId>> {
        &self.disabled_modular
    }

    /// Manually disable or re-enable a node.
    pub fn set_node_disabled(&mut self, id: &NodeId, disabled: bool) {
        replace_set_entry(&mut self.manual_disabled, id, disabled);
    }

    /// Enable or disable a tag filter.
    pub fn set_tag_enabled(&mut self, id: &TagId, enabled: bool) {
        replace_set_entry(&mut self.enabled_tags, id, enabled);
    }

    /// Mark a tag as hover-highlighted. Does not affect derivation.
    pub fn set_tag_active(&mut self, id: &TagId, active: bool) {
        replace_set_entry(&mut self.active_tags, id, active);
    }

    /// Disable or re-enable a node kind.
    pub fn set_kind_disabled(&mut self, kind: NodeKind, disabled: bool) {
        replace_set_entry(&mut self.disabled_kinds, &kind, disabled);
    }

    /// Contract or expand a modular pipeline.
    pub fn set_contracted(&mut self, id: &ModularPipelineId, contracted: bool) {
        replace_set_entry(&mut self.contracted, id, contracted);
    }

    /// Enable or disable a modular pipeline.
    pub fn set_modular_enabled(&mut self, id: &ModularPipelineId, enabled: bool) {
        replace_set_entry(&mut self.disabled_modular, id, !enabled);
    }

    /// Select the active registered pipeline, or clear the selection.
    pub fn set_active_pipeline(&mut self, pipeline: Option<PipelineId>) {
        self.active_pipeline = pipeline;
    }

    /// Show or hide layer bands.
    pub fn set_layers_visible(&mut self, visible: bool) {
        self.layers_visible = visible;
    }

    /// Set the slice selection endpoints.
    pub fn set_slice(&mut self, from: Option<NodeId>, to: Option<NodeId>) {
        self.slice = SliceSelection { from, to };
    }

    /// Clear the slice selection.
    pub fn clear_slice(&mut self) {
        self.slice = SliceSelection::default();
    }

    /// Set or clear the focused node for linked-node highlighting.
    pub fn set_focused(&mut self, focused: Option<NodeId>) {
        self.focused = focused;
    }

    /// Normalize a pipeline definition into derivable state.
    ///
    /// Records with missing references are dropped rather than rejected:
    /// edges whose endpoints do not resolve, duplicate edges, self-loops, and
    /// layer references to undeclared layers all log a warning and vanish.
    pub fn from_definition(def: PipelineDefinition) -> Self {
        let mut layer_order = Vec::new();
        let mut layer_names = BTreeMap::new();
        for layer in def.layers {
            let id = LayerId::new(layer.id);
            if layer_names.contains_key(&id) {
                tracing::warn!(layer = %id, "duplicate layer dropped");
                continue;
            }
            layer_names.insert(id.clone(), layer.name.unwrap_or_else(|| id.as_str().to_string()));
            layer_order.push(id);
        }

        let mut tags = BTreeMap::new();
        for tag in def.tags {
            let id = TagId::new(tag.id);
            let name = tag.name.unwrap_or_else(|| id.as_str().to_string());
            tags.insert(id.clone(), Tag { id, name });
        }

        let mut modular = BTreeMap::new();
        for mp in def.modular_pipelines {
            let id = ModularPipelineId::new(mp.id);
            let name = mp.name.unwrap_or_else(|| id.leaf().to_string());
            modular.insert(id.clone(), ModularPipeline { id, name });
        }

        let mut nodes = BTreeMap::new();
        for node in def.nodes {
            let id = NodeId::new(node.id);
            if nodes.contains_key(&id) {
                tracing::warn!(node = %id, "duplicate node dropped");
                continue;
            }

            let layer = node.layer.map(LayerId::new).and_then(|layer| {
                if layer_names.contains_key(&layer) {
                    Some(layer)
                } else {
                    tracing::warn!(node = %id, layer = %layer, "unknown layer reference dropped");
                    None
                }
            });

            let node_tags: BTreeSet<TagId> = node.tags.into_iter().map(TagId::new).collect();
            // Tags are implicitly declared by use.
            for tag in &node_tags {
                tags.entry(tag.clone()).or_insert_with(|| Tag {
                    id: tag.clone(),
                    name: tag.as_str().to_string(),
                });
            }

            // Membership in `a.b` implies membership in `a`; expand, dedupe,
            // and order outermost first.
            let mut memberships = BTreeSet::new();
            for mp in node.modular_pipelines {
                let mp = ModularPipelineId::new(mp);
                for ancestor in mp.ancestors() {
                    memberships.insert(ancestor);
                }
                memberships.insert(mp);
            }
            let mut modular_pipelines: Vec<ModularPipelineId> = memberships.into_iter().collect();
            modular_pipelines.sort_by_key(|mp| (mp.as_str().matches('.').count(), mp.clone()));
            for mp in &modular_pipelines {
                modular.entry(mp.clone()).or_insert_with(|| ModularPipeline {
                    id: mp.clone(),
                    name: mp.leaf().to_string(),
                });
            }

            let name = node.name.unwrap_or_else(|| id.as_str().to_string());
            nodes.insert(
                id.clone(),
                Node {
                    id,
                    name,
                    kind: node.kind,
                    layer,
                    tags: node_tags,
                    pipelines: node.pipelines.into_iter().map(PipelineId::new).collect(),
                    modular_pipelines,
                },
            );
        }

        let mut edges = BTreeMap::new();
        for edge in def.edges {
            let source = NodeId::new(edge.source);
            let target = NodeId::new(edge.target);
            if source == target {
                tracing::warn!(node = %source, "self-loop edge dropped");
                continue;
            }
            if !nodes.contains_key(&source) || !nodes.contains_key(&target) {
                tracing::warn!(
                    source = %source,
                    target = %target,
                    "edge with missing endpoint dropped"
                );
                continue;
            }
            let edge = Edge::new(source, target);
            edges.insert(edge.id.clone(), edge);
        }

        tracing::debug!(
            nodes = nodes.len(),
            edges = edges.len(),
            tags = tags.len(),
            modular_pipelines = modular.len(),
            layers = layer_order.len(),
            "normalized pipeline definition"
        );

        Self {
            nodes: Arc::new(NodeCatalog { nodes }),
            edges: Arc::new(EdgeCatalog { edges }),
            tags: Arc::new(TagCatalog { tags }),
            modular: Arc::new(ModularCatalog { pipelines: modular }),
            layers: Arc::new(LayerCatalog { order: layer_order, names: layer_names }),
            manual_disabled: Arc::new(BTreeSet::new()),
            enabled_tags: Arc::new(BTreeSet::new()),
            active_tags: Arc::new(BTreeSet::new()),
            disabled_kinds: Arc::new(BTreeSet::new()),
            contracted: Arc::new(BTreeSet::new()),
            disabled_modular: Arc::new(BTreeSet::new()),
            active_pipeline: None,
            layers_visible: true,
            slice: SliceSelection::default(),
            focused: None,
        }
    }
}

/// Replace an `Arc`-held set with a new allocation containing or lacking
/// `entry`. No-ops (already in the desired state) keep the slice identity so
/// downstream caches stay warm. A real change must allocate a fresh `Arc`;
/// in-place mutation would keep the pointer identity the caches key on.
fn replace_set_entry<T: Clone + Ord>(slot: &mut Arc<BTreeSet<T>>, entry: &T, present: bool) {
    if slot.contains(entry) == present {
        return;
    }
    let mut next = (**slot).clone();
    if present {
        next.insert(entry.clone());
    } else {
        next.remove(entry);
    }
    *slot = Arc::new(next);
}

// ---------------------------------------------------------------------------
// PipelineDefinition: the on-disk shape
// ---------------------------------------------------------------------------

/// A raw pipeline description as loaded from disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineDefinition {
    /// Node records.
    #[serde(default)]
    pub nodes: Vec<NodeDef>,

    /// Edge records.
    #[serde(default)]
    pub edges: Vec<EdgeDef>,

    /// Tag records. Tags referenced by nodes are declared implicitly.
    #[serde(default)]
    pub tags: Vec<TagDef>,

    /// Layer records, in canonical order.
    #[serde(default)]
    pub layers: Vec<LayerDef>,

    /// Modular pipeline records. Groups referenced by nodes are declared
    /// implicitly.
    #[serde(default)]
    pub modular_pipelines: Vec<ModularPipelineDef>,
}

/// A raw node record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDef {
    /// Unique identifier.
    pub id: String,

    /// Display name; defaults to the id.
    #[serde(default)]
    pub name: Option<String>,

    /// Node kind; defaults to `task`.
    #[serde(rename = "type", default = "default_node_kind")]
    pub kind: NodeKind,

    /// Layer reference.
    #[serde(default)]
    pub layer: Option<String>,

    /// Tag references.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Registered pipelines this node belongs to.
    #[serde(default)]
    pub pipelines: Vec<String>,

    /// Modular pipelines this node belongs to; ancestors are implied.
    #[serde(default)]
    pub modular_pipelines: Vec<String>,
}

fn default_node_kind() -> NodeKind {
    NodeKind::Task
}

/// A raw edge record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeDef {
    /// Source node id.
    pub source: String,

    /// Target node id.
    pub target: String,
}

/// A raw tag record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagDef {
    /// Unique identifier.
    pub id: String,

    /// Display name; defaults to the id.
    #[serde(default)]
    pub name: Option<String>,
}

/// A raw layer record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerDef {
    /// Unique identifier.
    pub id: String,

    /// Display name; defaults to the id.
    #[serde(default)]
    pub name: Option<String>,
}

/// A raw modular pipeline record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModularPipelineDef {
    /// Dot-namespaced identifier.
    pub id: String,

    /// Display name; defaults to the last namespace segment.
    #[serde(default)]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn def_node(id: &str) -> NodeDef {
        NodeDef {
            id: id.to_string(),
            name: None,
            kind: NodeKind::Task,
            layer: None,
            tags: Vec::new(),
            pipelines: Vec::new(),
            modular_pipelines: Vec::new(),
        }
    }

    fn two_node_state() -> PipelineState {
        PipelineState::from_definition(PipelineDefinition {
            nodes: vec![def_node("a"), def_node("b")],
            edges: vec![EdgeDef { source: "a".into(), target: "b".into() }],
            ..PipelineDefinition::default()
        })
    }

    #[test]
    fn definition_parses_from_json() {
        let definition: PipelineDefinition = serde_json::from_str(
            r#"{
                "nodes": [
                    {"id": "a", "type": "data", "layer": "raw", "tags": ["t"]},
                    {"id": "b"}
                ],
                "edges": [{"source": "a", "target": "b"}],
                "layers": [{"id": "raw", "name": "Raw"}]
            }"#,
        )
        .unwrap();
        let state = PipelineState::from_definition(definition);

        let a = state.nodes().get(&NodeId::new("a")).unwrap();
        assert_eq!(a.kind, NodeKind::Data);
        assert_eq!(a.layer, Some(LayerId::new("raw")));
        // Omitted fields take their defaults.
        let b = state.nodes().get(&NodeId::new("b")).unwrap();
        assert_eq!(b.kind, NodeKind::Task);
        assert_eq!(state.edges().len(), 1);
    }

    #[test]
    fn edges_with_missing_endpoints_are_dropped() {
        let state = PipelineState::from_definition(PipelineDefinition {
            nodes: vec![def_node("a")],
            edges: vec![
                EdgeDef { source: "a".into(), target: "ghost".into() },
                EdgeDef { source: "a".into(), target: "a".into() },
            ],
            ..PipelineDefinition::default()
        });
        assert!(state.edges().is_empty());
    }

    #[test]
    fn modular_pipeline_ancestors_are_implied() {
        let mut node = def_node("n");
        node.modular_pipelines = vec!["a.b.c".to_string()];
        let state = PipelineState::from_definition(PipelineDefinition {
            nodes: vec![node],
            ..PipelineDefinition::default()
        });

        let n = state.nodes().get(&NodeId::new("n")).unwrap();
        assert_eq!(
            n.modular_pipelines,
            vec![
                ModularPipelineId::new("a"),
                ModularPipelineId::new("a.b"),
                ModularPipelineId::new("a.b.c"),
            ]
        );
        assert!(state.modular_pipelines().contains(&ModularPipelineId::new("a.b")));
    }

    #[test]
    fn unknown_layer_reference_is_dropped() {
        let mut node = def_node("n");
        node.layer = Some("missing".to_string());
        let state = PipelineState::from_definition(PipelineDefinition {
            nodes: vec![node],
            ..PipelineDefinition::default()
        });
        assert_eq!(state.nodes().get(&NodeId::new("n")).unwrap().layer, None);
    }

    #[test]
    fn mutators_replace_only_their_own_slice() {
        let mut state = two_node_state();
        let nodes_before = Arc::clone(state.nodes_slice());
        let tags_before = Arc::clone(state.enabled_tags_slice());
        let manual_before = Arc::clone(state.manual_disabled_slice());

        state.set_node_disabled(&NodeId::new("a"), true);

        assert!(Arc::ptr_eq(&nodes_before, state.nodes_slice()));
        assert!(Arc::ptr_eq(&tags_before, state.enabled_tags_slice()));
        assert!(!Arc::ptr_eq(&manual_before, state.manual_disabled_slice()));
    }

    #[test]
    fn noop_mutation_keeps_slice_identity() {
        let mut state = two_node_state();
        let manual_before = Arc::clone(state.manual_disabled_slice());

        state.set_node_disabled(&NodeId::new("a"), false);

        assert!(Arc::ptr_eq(&manual_before, state.manual_disabled_slice()));
    }

    #[test]
    fn tag_hover_does_not_touch_filter_slice() {
        let mut state = two_node_state();
        let enabled_before = Arc::clone(state.enabled_tags_slice());

        state.set_tag_active(&TagId::new("t"), true);

        assert!(Arc::ptr_eq(&enabled_before, state.enabled_tags_slice()));
        assert!(state.active_tags().contains(&TagId::new("t")));
    }
}
