//! Command execution logic.
//!
//! This module contains the implementation of all CLI commands: load the
//! pipeline definition, apply the view toggles, run the derivation, print.

use std::path::Path;

use anyhow::Result;

use flowviz_graph::domain::NodeId;
use flowviz_graph::{Deriver, PipelineState};

use super::args::{InfoArgs, LinkedArgs, SliceArgs, ViewArgs, ViewFlags};
use crate::error::Error;
use crate::load;
use crate::output::{self, OutputMode};

fn prepare(pipeline: &Path, flags: &ViewFlags) -> crate::error::Result<PipelineState> {
    let mut state = load::load_state(pipeline)?;
    flags.collect_options()?.apply(&mut state)?;
    Ok(state)
}

/// A node id argument must name a node of the pipeline definition; the
/// engine would silently drop an unknown reference, which is the wrong
/// behavior for a typo on the command line.
fn require_node(state: &PipelineState, id: &str) -> crate::error::Result<NodeId> {
    let node = NodeId::new(id);
    if state.nodes().contains(&node) {
        Ok(node)
    } else {
        Err(Error::UnknownReference { entity: "node", id: id.to_string() })
    }
}

/// Execute the view command
pub fn execute_view(args: &ViewArgs, mode: OutputMode) -> Result<()> {
    let state = prepare(&args.definition, &args.view)?;
    let mut deriver = Deriver::new();
    let derived = deriver.derive(&state)?;

    output::print_derived(&derived, mode)?;
    Ok(())
}

/// Execute the slice command
pub fn execute_slice(args: &SliceArgs, mode: OutputMode) -> Result<()> {
    let mut state = prepare(&args.definition, &args.view)?;

    let from = args.from.as_deref().map(|id| require_node(&state, id)).transpose()?;
    let to = args.to.as_deref().map(|id| require_node(&state, id)).transpose()?;
    state.set_slice(from, to);

    let mut deriver = Deriver::new();
    let sliced = deriver.sliced_nodes(&state);
    let dependencies = args.deps.then(|| deriver.sliced_dependencies(&state));

    output::print_sliced(&sliced, dependencies.as_deref(), mode)?;
    Ok(())
}

/// Execute the linked command
pub fn execute_linked(args: &LinkedArgs, mode: OutputMode) -> Result<()> {
    let mut state = prepare(&args.definition, &args.view)?;
    let focused = require_node(&state, &args.node)?;
    state.set_focused(Some(focused.clone()));

    let mut deriver = Deriver::new();
    let linked = deriver.linked_nodes(&state);

    output::print_linked(&focused, &linked, mode)?;
    Ok(())
}

/// Execute the info command
pub fn execute_info(args: &InfoArgs, mode: OutputMode) -> Result<()> {
    let state = load::load_state(&args.definition)?;
    output::print_info(&state, mode)?;
    Ok(())
}
