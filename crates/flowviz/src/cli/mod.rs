//! CLI argument parsing and command dispatch.
//!
//! This module provides the command-line interface for flowviz using clap's
//! derive API. Each command has its own argument struct with validation and
//! helpful error messages.
//!
//! # Commands
//!
//! - `view`: Derive and print the visible graph (nodes, edges, bands, ranks)
//! - `slice`: Print the node set between two selected nodes
//! - `linked`: Print the ancestors and descendants of a node
//! - `info`: Show pipeline summary statistics
//!
//! # Global Flags
//!
//! - `--json`: Output in JSON format (applies to all commands)
//!
//! # Example
//!
//! ```bash
//! flowviz view pipeline.json --enable-tag etl --contract prep
//! flowviz slice pipeline.json --from ingest --to train --deps
//! flowviz linked pipeline.json train --json
//! ```

mod args;
mod execute;
mod validators;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::output::OutputMode;

// Re-export argument structs
pub use args::{InfoArgs, LinkedArgs, SliceArgs, ViewArgs, ViewFlags};

// Re-export validators for external use
pub use validators::{validate_group_id, validate_kind, validate_node_id};

/// Flowviz - derive and inspect pipeline visualization graphs
///
/// Loads a pipeline definition, applies view toggles (tag filters, node-kind
/// filters, modular-pipeline contraction, slicing), and prints what a
/// renderer would show.
#[derive(Parser, Debug)]
#[command(name = "flowviz")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format for programmatic use
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Derive and print the visible graph
    ///
    /// Runs the full derivation chain and prints the visible nodes and
    /// edges, the layer bands, and the rank assigned to each node.
    View(ViewArgs),

    /// Print the slice between two nodes
    ///
    /// Finds a directed path between --from and --to and prints the node
    /// set lying on it. Disconnected endpoints yield just the endpoint
    /// pair.
    Slice(SliceArgs),

    /// Print the nodes linked to a focused node
    ///
    /// Walks visible edges in both directions and prints the ancestors and
    /// descendants of the given node.
    Linked(LinkedArgs),

    /// Show pipeline summary statistics
    ///
    /// Displays node counts by kind, edge and tag counts, layers, and the
    /// modular pipeline tree.
    Info(InfoArgs),
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Execute the parsed command.
    ///
    /// # Errors
    ///
    /// Propagates load, validation, and derivation failures; clap handles
    /// usage errors before this point.
    pub fn execute(&self) -> Result<()> {
        let mode = if self.json { OutputMode::Json } else { OutputMode::Text };
        match &self.command {
            Commands::View(args) => execute::execute_view(args, mode),
            Commands::Slice(args) => execute::execute_slice(args, mode),
            Commands::Linked(args) => execute::execute_linked(args, mode),
            Commands::Info(args) => execute::execute_info(args, mode),
        }
    }
}
