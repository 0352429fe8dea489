//! Domain types for pipeline graphs.
//!
//! This module contains the entity types shared by every derivation stage:
//! string-newtype identifiers, the node/edge/tag/layer/modular-pipeline
//! records of the normalized pipeline description, and the output shapes
//! handed to the layout boundary.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Declare a string-newtype identifier with the standard conversions.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            /// Create a new identifier.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// The identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id! {
    /// Unique identifier for a node (real or pseudo).
    NodeId
}

string_id! {
    /// Unique identifier for a tag.
    TagId
}

string_id! {
    /// Unique identifier for a layer.
    LayerId
}

string_id! {
    /// Unique identifier for a registered (top-level) pipeline.
    PipelineId
}

string_id! {
    /// Dot-namespaced identifier for a modular pipeline, e.g. `a.b.c`.
    ModularPipelineId
}

impl ModularPipelineId {
    /// Whether `other` is strictly nested inside this modular pipeline.
    ///
    /// `a` contains `a.b` and `a.b.c`, but not itself and not `ab`.
    pub fn contains(&self, other: &ModularPipelineId) -> bool {
        other.0.len() > self.0.len()
            && other.0.starts_with(&self.0)
            && other.0.as_bytes()[self.0.len()] == b'.'
    }

    /// The immediately enclosing modular pipeline, if any.
    pub fn parent(&self) -> Option<ModularPipelineId> {
        self.0.rfind('.').map(|dot| Self(self.0[..dot].to_string()))
    }

    /// All enclosing modular pipelines, outermost first.
    pub fn ancestors(&self) -> Vec<ModularPipelineId> {
        let mut out = Vec::new();
        for (i, b) in self.0.bytes().enumerate() {
            if b == b'.' {
                out.push(Self(self.0[..i].to_string()));
            }
        }
        out
    }

    /// The last namespace segment, used as a display-name fallback.
    pub fn leaf(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }
}

/// Unique identifier for an edge: the composite `source|target` key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeId(pub String);

impl EdgeId {
    /// Build the composite key for an ordered source/target pair.
    pub fn of(source: &NodeId, target: &NodeId) -> Self {
        Self(format!("{source}|{target}"))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The closed set of node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// A computation step.
    Task,

    /// A dataset produced or consumed by tasks.
    Data,

    /// A parameters input.
    Parameters,

    /// A modular-pipeline pseudo-node standing in for a collapsed group.
    Pipeline,
}

impl NodeKind {
    /// Stable lowercase name, matching the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Task => "task",
            NodeKind::Data => "data",
            NodeKind::Parameters => "parameters",
            NodeKind::Pipeline => "pipeline",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NodeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "task" => Ok(NodeKind::Task),
            "data" => Ok(NodeKind::Data),
            "parameters" => Ok(NodeKind::Parameters),
            "pipeline" => Ok(NodeKind::Pipeline),
            other => Err(format!(
                "unknown node kind '{other}' (expected task, data, parameters, or pipeline)"
            )),
        }
    }
}

/// A node of the normalized pipeline description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier.
    pub id: NodeId,

    /// Display name.
    pub name: String,

    /// Node kind.
    pub kind: NodeKind,

    /// Layer this node belongs to, if any.
    pub layer: Option<LayerId>,

    /// Tags attached to this node.
    pub tags: BTreeSet<TagId>,

    /// Registered pipelines this node is a member of.
    pub pipelines: BTreeSet<PipelineId>,

    /// Modular pipelines containing this node, outermost first.
    pub modular_pipelines: Vec<ModularPipelineId>,
}

/// A directed edge between two nodes.
///
/// Real edges come from the pipeline definition; transitive and
/// modular-pipeline pseudo-edges are recomputed every derivation pass and
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Composite `source|target` key, unique per ordered pair.
    pub id: EdgeId,

    /// Source node id.
    pub source: NodeId,

    /// Target node id.
    pub target: NodeId,
}

impl Edge {
    /// Create an edge, deriving its composite id.
    pub fn new(source: NodeId, target: NodeId) -> Self {
        let id = EdgeId::of(&source, &target);
        Self { id, source, target }
    }
}

/// A tag usable as a node filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Unique identifier.
    pub id: TagId,

    /// Display name.
    pub name: String,
}

/// A named, possibly nested grouping of nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModularPipeline {
    /// Dot-namespaced identifier.
    pub id: ModularPipelineId,

    /// Display name.
    pub name: String,
}

/// Transient pair of node ids bounding a slice selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SliceSelection {
    /// Upstream endpoint.
    pub from: Option<NodeId>,

    /// Downstream endpoint.
    pub to: Option<NodeId>,
}

impl SliceSelection {
    /// Whether neither endpoint is set.
    pub fn is_empty(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }
}

/// Base width of a rendered node, before accounting for its name.
const NODE_BASE_WIDTH: u32 = 50;

/// Width contributed per character of the display name.
const NODE_CHAR_WIDTH: u32 = 7;

/// Height of a rendered node, by kind.
const NODE_HEIGHT_TASK: u32 = 40;
const NODE_HEIGHT_DATA: u32 = 36;
const NODE_HEIGHT_PIPELINE: u32 = 48;

/// A visible node as handed to the external layout engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleNode {
    /// Unique identifier.
    pub id: NodeId,

    /// Display name.
    pub name: String,

    /// Node kind.
    pub kind: NodeKind,

    /// Layer this node belongs to, if any.
    pub layer: Option<LayerId>,

    /// Size hint: width in layout units.
    pub width: u32,

    /// Size hint: height in layout units.
    pub height: u32,
}

impl VisibleNode {
    /// Project a node into its layout-boundary shape.
    ///
    /// The size hints are coarse text-proportional estimates; precise text
    /// measurement belongs to the renderer, not this engine.
    pub fn from_node(node: &Node) -> Self {
        let width = NODE_BASE_WIDTH
            + NODE_CHAR_WIDTH * u32::try_from(node.name.chars().count()).unwrap_or(u32::MAX / NODE_CHAR_WIDTH);
        let height = match node.kind {
            NodeKind::Task => NODE_HEIGHT_TASK,
            NodeKind::Data | NodeKind::Parameters => NODE_HEIGHT_DATA,
            NodeKind::Pipeline => NODE_HEIGHT_PIPELINE,
        };
        Self {
            id: node.id.clone(),
            name: node.name.clone(),
            kind: node.kind,
            layer: node.layer.clone(),
            width,
            height,
        }
    }
}

/// A visible layer band as handed to the external layout engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerBand {
    /// Layer identifier.
    pub id: LayerId,

    /// Display name.
    pub name: String,

    /// Position in the canonical layer sequence.
    pub order: usize,
}
