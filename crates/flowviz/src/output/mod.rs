//! Output formatting for CLI commands.
//!
//! This module provides utilities for formatting command output in both
//! human-readable text format and JSON format for programmatic use. The
//! JSON shapes are built by pure functions so they stay stable and
//! testable; the print functions only add styling.

use std::collections::{BTreeMap, BTreeSet};
use std::env;
use std::io;

use colored::Colorize;
use serde::Serialize;
use serde_json::json;

use flowviz_graph::domain::{NodeId, NodeKind};
use flowviz_graph::{DerivedGraph, PipelineState};

/// Output mode for a command invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable, possibly colored text.
    Text,

    /// Pretty-printed JSON on stdout.
    Json,
}

/// Configuration for output formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Whether to use ASCII-only connectors instead of Unicode.
    pub use_ascii: bool,

    /// Whether to use colors in output.
    pub use_colors: bool,
}

impl OutputConfig {
    /// Create an `OutputConfig` by reading from environment variables.
    ///
    /// Reads:
    /// - `FLOWVIZ_ASCII`: set to "1" or "true" for ASCII-only connectors
    /// - `NO_COLOR`: standard env var, any value disables colors
    /// - `FLOWVIZ_COLOR`: set to "0" or "false" to disable colors
    pub fn from_env() -> Self {
        let use_ascii = env::var("FLOWVIZ_ASCII")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        // Respect the NO_COLOR standard (https://no-color.org/)
        let use_colors = env::var("NO_COLOR").is_err()
            && env::var("FLOWVIZ_COLOR")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true);

        Self { use_ascii, use_colors }
    }

    fn arrow(&self) -> &'static str {
        if self.use_ascii { "->" } else { "→" }
    }

    fn id(&self, s: &str) -> String {
        if self.use_colors { s.cyan().to_string() } else { s.to_string() }
    }

    fn heading(&self, s: &str) -> String {
        if self.use_colors { s.white().bold().to_string() } else { s.to_string() }
    }

    fn dim(&self, s: &str) -> String {
        if self.use_colors { s.dimmed().to_string() } else { s.to_string() }
    }

    fn kind(&self, kind: NodeKind) -> String {
        let name = kind.as_str();
        if !self.use_colors {
            return name.to_string();
        }
        match kind {
            NodeKind::Task => name.yellow().to_string(),
            NodeKind::Data => name.blue().to_string(),
            NodeKind::Parameters => name.magenta().to_string(),
            NodeKind::Pipeline => name.green().to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { use_ascii: false, use_colors: true }
    }
}

/// Print any serializable value as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
    let output = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    println!("{output}");
    Ok(())
}

/// The stable JSON shape of a derivation pass.
pub fn derived_to_json(derived: &DerivedGraph) -> serde_json::Value {
    json!({
        "nodes": derived
            .visible
            .nodes()
            .iter()
            .map(|n| {
                json!({
                    "id": n.id,
                    "name": n.name,
                    "type": n.kind,
                    "layer": n.layer,
                    "width": n.width,
                    "height": n.height,
                    "rank": derived.ranks.get(&n.id),
                })
            })
            .collect::<Vec<_>>(),
        "edges": derived
            .visible
            .edges()
            .iter()
            .map(|e| json!({ "id": e.id, "source": e.source, "target": e.target }))
            .collect::<Vec<_>>(),
        "layers": derived
            .bands
            .iter()
            .map(|b| json!({ "id": b.id, "name": b.name, "order": b.order }))
            .collect::<Vec<_>>(),
    })
}

/// Print the derived graph.
pub fn print_derived(derived: &DerivedGraph, mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Json => print_json(&derived_to_json(derived)),
        OutputMode::Text => {
            let config = OutputConfig::from_env();
            print_derived_text(derived, &config);
            Ok(())
        }
    }
}

fn print_derived_text(derived: &DerivedGraph, config: &OutputConfig) {
    let nodes = derived.visible.nodes();
    let edges = derived.visible.edges();

    println!(
        "{} {} nodes, {} edges",
        config.heading("Visible graph:"),
        nodes.len(),
        edges.len()
    );
    println!();

    for node in nodes {
        let mut annotations = Vec::new();
        if let Some(layer) = &node.layer {
            annotations.push(format!("layer={layer}"));
        }
        if let Some(rank) = derived.ranks.get(&node.id) {
            annotations.push(format!("rank={rank}"));
        }
        println!(
            "  {:<28} {:<12} {}",
            config.id(node.id.as_str()),
            config.kind(node.kind),
            config.dim(&annotations.join("  "))
        );
    }

    if !edges.is_empty() {
        println!();
        for edge in edges {
            println!(
                "  {} {} {}",
                config.id(edge.source.as_str()),
                config.dim(config.arrow()),
                config.id(edge.target.as_str())
            );
        }
    }

    if !derived.bands.is_empty() {
        println!();
        let bands: Vec<&str> = derived.bands.iter().map(|b| b.name.as_str()).collect();
        println!("{} {}", config.heading("Layers:"), bands.join(", "));
    }
}

/// The stable JSON shape of a slice result.
pub fn sliced_to_json(
    sliced: &BTreeSet<NodeId>,
    dependencies: Option<&BTreeSet<NodeId>>,
) -> serde_json::Value {
    json!({
        "sliced": sliced.iter().collect::<Vec<_>>(),
        "dependencies": dependencies.map(|deps| deps.iter().collect::<Vec<_>>()),
    })
}

/// Print a slice result.
pub fn print_sliced(
    sliced: &BTreeSet<NodeId>,
    dependencies: Option<&BTreeSet<NodeId>>,
    mode: OutputMode,
) -> io::Result<()> {
    match mode {
        OutputMode::Json => print_json(&sliced_to_json(sliced, dependencies)),
        OutputMode::Text => {
            let config = OutputConfig::from_env();
            if sliced.is_empty() {
                println!("Empty slice (no endpoints selected)");
                return Ok(());
            }
            println!("{} {} nodes", config.heading("Sliced pipeline:"), sliced.len());
            for id in sliced {
                println!("  {}", config.id(id.as_str()));
            }
            if let Some(deps) = dependencies {
                println!();
                if deps.is_empty() {
                    println!("No extra upstream dependencies");
                } else {
                    println!(
                        "{} {} nodes",
                        config.heading("Upstream dependencies:"),
                        deps.len()
                    );
                    for id in deps {
                        println!("  {}", config.id(id.as_str()));
                    }
                }
            }
            Ok(())
        }
    }
}

/// The stable JSON shape of a linked-node result.
pub fn linked_to_json(center: &NodeId, linked: &BTreeMap<NodeId, bool>) -> serde_json::Value {
    json!({
        "center": center,
        "linked": linked
            .iter()
            .filter(|(_, is_neighbor)| **is_neighbor)
            .map(|(id, _)| id)
            .collect::<Vec<_>>(),
    })
}

/// Print a linked-node result.
pub fn print_linked(
    center: &NodeId,
    linked: &BTreeMap<NodeId, bool>,
    mode: OutputMode,
) -> io::Result<()> {
    match mode {
        OutputMode::Json => print_json(&linked_to_json(center, linked)),
        OutputMode::Text => {
            let config = OutputConfig::from_env();
            let neighbors: Vec<&NodeId> =
                linked.iter().filter(|(_, n)| **n).map(|(id, _)| id).collect();
            if neighbors.is_empty() {
                println!(
                    "No nodes linked to \"{}\" (is it visible under the current filters?)",
                    config.id(center.as_str())
                );
                return Ok(());
            }
            println!(
                "{} {} linked to \"{}\"",
                config.heading("Linked nodes:"),
                neighbors.len(),
                config.id(center.as_str())
            );
            for id in neighbors {
                println!("  {}", config.id(id.as_str()));
            }
            Ok(())
        }
    }
}

/// The stable JSON shape of the info summary.
pub fn info_to_json(state: &PipelineState) -> serde_json::Value {
    let mut by_kind: BTreeMap<&str, usize> = BTreeMap::new();
    for node in state.nodes().iter() {
        *by_kind.entry(node.kind.as_str()).or_default() += 1;
    }

    let modular: Vec<serde_json::Value> = state
        .modular_pipelines()
        .iter()
        .map(|mp| {
            let members = state
                .nodes()
                .iter()
                .filter(|n| n.modular_pipelines.contains(&mp.id))
                .count();
            json!({ "id": mp.id, "name": mp.name, "members": members })
        })
        .collect();

    json!({
        "nodes": { "total": state.nodes().len(), "by_type": by_kind },
        "edges": state.edges().len(),
        "tags": state.tags().iter().map(|t| &t.id).collect::<Vec<_>>(),
        "layers": state.layers().order(),
        "modular_pipelines": modular,
    })
}

/// Print the info summary.
pub fn print_info(state: &PipelineState, mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Json => print_json(&info_to_json(state)),
        OutputMode::Text => {
            let config = OutputConfig::from_env();
            println!("{}", config.heading("Pipeline information"));
            println!();

            let mut by_kind: BTreeMap<&str, usize> = BTreeMap::new();
            for node in state.nodes().iter() {
                *by_kind.entry(node.kind.as_str()).or_default() += 1;
            }
            let kinds: Vec<String> =
                by_kind.iter().map(|(kind, count)| format!("{count} {kind}")).collect();
            println!("Nodes:  {} ({})", state.nodes().len(), kinds.join(", "));
            println!("Edges:  {}", state.edges().len());

            let tags: Vec<&str> = state.tags().iter().map(|t| t.id.as_str()).collect();
            if !tags.is_empty() {
                println!("Tags:   {}", tags.join(", "));
            }
            let layers: Vec<&str> = state.layers().order().iter().map(|l| l.as_str()).collect();
            if !layers.is_empty() {
                println!("Layers: {}", layers.join(", "));
            }

            let mut groups = false;
            for mp in state.modular_pipelines().iter() {
                if !groups {
                    println!();
                    println!("{}", config.heading("Modular pipelines"));
                    groups = true;
                }
                let depth = mp.id.as_str().matches('.').count();
                let members = state
                    .nodes()
                    .iter()
                    .filter(|n| n.modular_pipelines.contains(&mp.id))
                    .count();
                println!(
                    "  {}{} {}",
                    "  ".repeat(depth),
                    config.id(mp.id.as_str()),
                    config.dim(&format!("({members} nodes)"))
                );
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use flowviz_graph::state::{EdgeDef, NodeDef, PipelineDefinition};
    use flowviz_graph::{Deriver, PipelineState};

    fn sample() -> PipelineState {
        PipelineState::from_definition(PipelineDefinition {
            nodes: vec![
                NodeDef {
                    id: "a".to_string(),
                    name: None,
                    kind: NodeKind::Task,
                    layer: None,
                    tags: Vec::new(),
                    pipelines: Vec::new(),
                    modular_pipelines: Vec::new(),
                },
                NodeDef {
                    id: "b".to_string(),
                    name: None,
                    kind: NodeKind::Data,
                    layer: None,
                    tags: Vec::new(),
                    pipelines: Vec::new(),
                    modular_pipelines: Vec::new(),
                },
            ],
            edges: vec![EdgeDef { source: "a".to_string(), target: "b".to_string() }],
            ..PipelineDefinition::default()
        })
    }

    #[test]
    fn derived_json_shape_is_stable() {
        let state = sample();
        let mut deriver = Deriver::new();
        let derived = deriver.derive(&state).unwrap();

        let value = derived_to_json(&derived);
        assert_eq!(value["nodes"].as_array().unwrap().len(), 2);
        assert_eq!(value["edges"][0]["id"], "a|b");
        assert_eq!(value["nodes"][0]["id"], "a");
        assert_eq!(value["nodes"][0]["type"], "task");
        assert!(value["layers"].as_array().unwrap().is_empty());
    }

    #[test]
    fn sliced_json_keeps_dependencies_nullable() {
        let sliced: BTreeSet<NodeId> = [NodeId::new("a")].into();
        let value = sliced_to_json(&sliced, None);
        assert!(value["dependencies"].is_null());
        assert_eq!(value["sliced"][0], "a");
    }

    #[test]
    fn linked_json_lists_only_neighbors() {
        let linked: BTreeMap<NodeId, bool> =
            [(NodeId::new("a"), true), (NodeId::new("center"), false)].into();
        let value = linked_to_json(&NodeId::new("center"), &linked);
        assert_eq!(value["center"], "center");
        assert_eq!(value["linked"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn info_json_counts_by_kind() {
        let value = info_to_json(&sample());
        assert_eq!(value["nodes"]["total"], 2);
        assert_eq!(value["nodes"]["by_type"]["task"], 1);
        assert_eq!(value["nodes"]["by_type"]["data"], 1);
        assert_eq!(value["edges"], 1);
    }
}
