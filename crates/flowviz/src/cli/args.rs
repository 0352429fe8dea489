//! CLI argument structs for all commands.
//!
//! Each command has its own argument struct with clap derive attributes for
//! parsing and validation. The graph commands share the [`ViewFlags`] set of
//! toggles, flattened into their argument structs.

use std::path::PathBuf;

use clap::Parser;

use crate::error::Result;
use crate::view::ViewOptions;

use super::validators::{validate_group_id, validate_kind, validate_node_id};

/// View toggles shared by the graph commands.
#[derive(Parser, Debug, Clone, Default)]
pub struct ViewFlags {
    /// Manually disable a node (repeatable)
    #[arg(long = "disable-node", value_name = "NODE_ID", value_parser = validate_node_id)]
    pub disable_node: Vec<String>,

    /// Enable a tag filter (repeatable)
    ///
    /// With at least one tag enabled, only nodes carrying an enabled tag
    /// stay visible; untagged nodes are hidden.
    #[arg(long = "enable-tag", value_name = "TAG")]
    pub enable_tag: Vec<String>,

    /// Disable a node kind: task, data, parameters, or pipeline (repeatable)
    #[arg(long = "disable-type", value_name = "KIND", value_parser = validate_kind)]
    pub disable_type: Vec<String>,

    /// Restrict the view to members of a registered pipeline
    #[arg(long, value_name = "PIPELINE_ID")]
    pub pipeline: Option<String>,

    /// Contract a modular pipeline into a single node (repeatable)
    #[arg(long, value_name = "GROUP_ID", value_parser = validate_group_id)]
    pub contract: Vec<String>,

    /// Disable a modular pipeline and all its members (repeatable)
    #[arg(long = "disable-group", value_name = "GROUP_ID", value_parser = validate_group_id)]
    pub disable_group: Vec<String>,

    /// Hide layer bands and skip rank assignment
    #[arg(long = "no-layers")]
    pub no_layers: bool,

    /// Read view options from a YAML file; flags extend the file
    #[arg(long = "view-file", value_name = "FILE")]
    pub view_file: Option<PathBuf>,
}

impl ViewFlags {
    /// Collect the effective view options: the view file (if any) extended
    /// by the command-line flags.
    pub fn collect_options(&self) -> Result<ViewOptions> {
        let base = match &self.view_file {
            Some(path) => ViewOptions::load(path)?,
            None => ViewOptions::default(),
        };
        Ok(base.merged_with(ViewOptions {
            disable_nodes: self.disable_node.clone(),
            enable_tags: self.enable_tag.clone(),
            disable_kinds: self.disable_type.clone(),
            pipeline: self.pipeline.clone(),
            contract: self.contract.clone(),
            disable_groups: self.disable_group.clone(),
            hide_layers: self.no_layers,
        }))
    }
}

/// Arguments for the `view` command
#[derive(Parser, Debug, Clone)]
pub struct ViewArgs {
    /// Path to the pipeline definition (JSON)
    #[arg(value_name = "PIPELINE")]
    pub definition: PathBuf,

    /// View toggles
    #[command(flatten)]
    pub view: ViewFlags,
}

/// Arguments for the `slice` command
#[derive(Parser, Debug, Clone)]
pub struct SliceArgs {
    /// Path to the pipeline definition (JSON)
    #[arg(value_name = "PIPELINE")]
    pub definition: PathBuf,

    /// Upstream endpoint of the slice
    #[arg(long, value_name = "NODE_ID", value_parser = validate_node_id)]
    pub from: Option<String>,

    /// Downstream endpoint of the slice
    #[arg(long, value_name = "NODE_ID", value_parser = validate_node_id)]
    pub to: Option<String>,

    /// Also print the upstream dependency closure needed to run the slice
    #[arg(long)]
    pub deps: bool,

    /// View toggles
    #[command(flatten)]
    pub view: ViewFlags,
}

/// Arguments for the `linked` command
#[derive(Parser, Debug, Clone)]
pub struct LinkedArgs {
    /// Path to the pipeline definition (JSON)
    #[arg(value_name = "PIPELINE")]
    pub definition: PathBuf,

    /// The focused node
    #[arg(value_name = "NODE_ID", value_parser = validate_node_id)]
    pub node: String,

    /// View toggles
    #[command(flatten)]
    pub view: ViewFlags,
}

/// Arguments for the `info` command
#[derive(Parser, Debug, Clone)]
pub struct InfoArgs {
    /// Path to the pipeline definition (JSON)
    #[arg(value_name = "PIPELINE")]
    pub definition: PathBuf,
}
