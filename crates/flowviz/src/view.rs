//! View options: the toggles applied on top of a loaded pipeline.
//!
//! Options come from command-line flags, from a YAML view file, or both
//! (flags extend the file). Applying them validates every referenced id
//! against the pipeline definition, so a typo surfaces as a typed error
//! instead of being silently dropped by the engine.

use std::path::Path;

use serde::{Deserialize, Serialize};

use flowviz_graph::PipelineState;
use flowviz_graph::domain::{ModularPipelineId, NodeId, NodeKind, PipelineId, TagId};

use crate::error::{Error, Result};

/// The view toggles of one invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewOptions {
    /// Node ids to disable manually.
    pub disable_nodes: Vec<String>,

    /// Tag filters to enable.
    pub enable_tags: Vec<String>,

    /// Node kinds to disable (task, data, parameters, pipeline).
    pub disable_kinds: Vec<String>,

    /// Registered pipeline to activate.
    pub pipeline: Option<String>,

    /// Modular pipelines to contract.
    pub contract: Vec<String>,

    /// Modular pipelines to disable entirely.
    pub disable_groups: Vec<String>,

    /// Hide layer bands and ranks.
    pub hide_layers: bool,
}

impl ViewOptions {
    /// Load view options from a YAML file.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] when the file cannot be read, [`Error::View`] when it is
    /// not a valid view options document.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&text).map_err(|e| Error::View(format!("{}: {e}", path.display())))
    }

    /// Extend these options with another set (command-line flags on top of a
    /// view file). Lists append; scalars from `other` win when set.
    #[must_use]
    pub fn merged_with(mut self, other: ViewOptions) -> Self {
        self.disable_nodes.extend(other.disable_nodes);
        self.enable_tags.extend(other.enable_tags);
        self.disable_kinds.extend(other.disable_kinds);
        self.contract.extend(other.contract);
        self.disable_groups.extend(other.disable_groups);
        if other.pipeline.is_some() {
            self.pipeline = other.pipeline;
        }
        self.hide_layers |= other.hide_layers;
        self
    }

    /// Apply the toggles to a pipeline state.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownReference`] when an id does not resolve against the
    /// pipeline definition.
    pub fn apply(&self, state: &mut PipelineState) -> Result<()> {
        for id in &self.disable_nodes {
            let node = NodeId::new(id.as_str());
            if !state.nodes().contains(&node) {
                return Err(Error::UnknownReference { entity: "node", id: id.clone() });
            }
            state.set_node_disabled(&node, true);
        }

        for tag in &self.enable_tags {
            let tag_id = TagId::new(tag.as_str());
            if !state.tags().contains(&tag_id) {
                return Err(Error::UnknownReference { entity: "tag", id: tag.clone() });
            }
            state.set_tag_enabled(&tag_id, true);
        }

        for kind in &self.disable_kinds {
            let kind: NodeKind = kind
                .parse()
                .map_err(|_| Error::UnknownReference { entity: "node kind", id: kind.clone() })?;
            state.set_kind_disabled(kind, true);
        }

        for group in &self.contract {
            let group_id = ModularPipelineId::new(group.as_str());
            if !state.modular_pipelines().contains(&group_id) {
                return Err(Error::UnknownReference {
                    entity: "modular pipeline",
                    id: group.clone(),
                });
            }
            state.set_contracted(&group_id, true);
        }

        for group in &self.disable_groups {
            let group_id = ModularPipelineId::new(group.as_str());
            if !state.modular_pipelines().contains(&group_id) {
                return Err(Error::UnknownReference {
                    entity: "modular pipeline",
                    id: group.clone(),
                });
            }
            state.set_modular_enabled(&group_id, false);
        }

        if let Some(pipeline) = &self.pipeline {
            state.set_active_pipeline(Some(PipelineId::new(pipeline.as_str())));
        }

        if self.hide_layers {
            state.set_layers_visible(false);
        }

        Ok(())
    }
}
