//! Integration tests for the full derivation chain.
//!
//! These exercise the public API end to end: normalization, filtering,
//! contraction, transitive bridging, rank assignment, slicing, and the
//! memoization contract.

use std::collections::BTreeSet;
use std::sync::Arc;

use flowviz_graph::domain::{ModularPipelineId, NodeId, NodeKind, TagId};
use flowviz_graph::state::{
    EdgeDef, LayerDef, ModularPipelineDef, NodeDef, PipelineDefinition, TagDef,
};
use flowviz_graph::{Deriver, Error, PipelineState};

fn node(id: &str) -> NodeDef {
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

fn edge(source: &str, target: &str) -> EdgeDef {
    EdgeDef { source: source.to_string(), target: target.to_string() }
}

/// A small but representative pipeline: two layers, one tag, one modular
/// pipeline with an internal edge.
fn fixture() -> PipelineState {
    let mut ingest = node("ingest");
    ingest.layer = Some("raw".to_string());
    ingest.tags = vec!["etl".to_string()];

    let mut clean = node("clean");
    clean.layer = Some("raw".to_string());
    clean.tags = vec!["etl".to_string()];
    clean.modular_pipelines = vec!["prep".to_string()];

    let mut join = node("join");
    join.layer = Some("raw".to_string());
    join.modular_pipelines = vec!["prep".to_string()];

    let mut features = node("features");
    features.layer = Some("model".to_string());
    features.kind = NodeKind::Data;

    let mut train = node("train");
    train.layer = Some("model".to_string());
    train.tags = vec!["ml".to_string()];

    PipelineState::from_definition(PipelineDefinition {
        nodes: vec![ingest, clean, join, features, train],
        edges: vec![
            edge("ingest", "clean"),
            edge("clean", "join"),
            edge("join", "features"),
            edge("features", "train"),
        ],
        tags: vec![
            TagDef { id: "etl".to_string(), name: None },
            TagDef { id: "ml".to_string(), name: None },
        ],
        layers: vec![
            LayerDef { id: "raw".to_string(), name: Some("Raw".to_string()) },
            LayerDef { id: "model".to_string(), name: Some("Model".to_string()) },
        ],
        modular_pipelines: vec![ModularPipelineDef {
            id: "prep".to_string(),
            name: Some("Preparation".to_string()),
        }],
        ..PipelineDefinition::default()
    })
}

fn visible_ids(deriver: &mut Deriver, state: &PipelineState) -> Vec<String> {
    deriver
        .visible_graph(state)
        .nodes()
        .iter()
        .map(|n| n.id.as_str().to_string())
        .collect()
}

fn visible_edge_ids(deriver: &mut Deriver, state: &PipelineState) -> Vec<String> {
    deriver
        .visible_graph(state)
        .edges()
        .iter()
        .map(|e| e.id.as_str().to_string())
        .collect()
}

#[test]
fn no_dangling_edges_in_the_fixture() {
    let state = fixture();
    let mut deriver = Deriver::new();
    let derived = deriver.derive(&state).unwrap();

    for edge in derived.visible.edges() {
        assert!(derived.visible.contains(&edge.source), "dangling source on {}", edge.id);
        assert!(derived.visible.contains(&edge.target), "dangling target on {}", edge.id);
    }
}

#[test]
fn disabling_a_middle_node_bridges_its_neighbors() {
    // A -> B -> C with B disabled: visible {A, C} with one transitive edge.
    let state = {
        let mut state = PipelineState::from_definition(PipelineDefinition {
            nodes: vec![node("A"), node("B"), node("C")],
            edges: vec![edge("A", "B"), edge("B", "C")],
            ..PipelineDefinition::default()
        });
        state.set_node_disabled(&NodeId::new("B"), true);
        state
    };
    let mut deriver = Deriver::new();

    assert_eq!(visible_ids(&mut deriver, &state), vec!["A", "C"]);
    assert_eq!(visible_edge_ids(&mut deriver, &state), vec!["A|C"]);
}

#[test]
fn contracted_modular_pipeline_collapses_to_one_node() {
    // P = {X, Y} with X -> Y internal and W -> X, Y -> Z external.
    let state = {
        let mut x = node("X");
        x.modular_pipelines = vec!["P".to_string()];
        let mut y = node("Y");
        y.modular_pipelines = vec!["P".to_string()];
        let mut state = PipelineState::from_definition(PipelineDefinition {
            nodes: vec![node("W"), x, y, node("Z")],
            edges: vec![edge("W", "X"), edge("X", "Y"), edge("Y", "Z")],
            ..PipelineDefinition::default()
        });
        state.set_contracted(&ModularPipelineId::new("P"), true);
        state
    };
    let mut deriver = Deriver::new();

    assert_eq!(visible_ids(&mut deriver, &state), vec!["P", "W", "Z"]);
    assert_eq!(visible_edge_ids(&mut deriver, &state), vec!["P|Z", "W|P"]);

    let graph = deriver.visible_graph(&state);
    let pipeline_node = graph.nodes().iter().find(|n| n.id.as_str() == "P").unwrap();
    assert_eq!(pipeline_node.kind, NodeKind::Pipeline);
}

#[test]
fn expanded_modular_pipeline_shows_members_not_the_group() {
    let state = {
        let mut x = node("X");
        x.modular_pipelines = vec!["P".to_string()];
        PipelineState::from_definition(PipelineDefinition {
            nodes: vec![x, node("W")],
            edges: vec![edge("W", "X")],
            ..PipelineDefinition::default()
        })
    };
    let mut deriver = Deriver::new();

    assert_eq!(visible_ids(&mut deriver, &state), vec!["W", "X"]);
    assert_eq!(visible_edge_ids(&mut deriver, &state), vec!["W|X"]);
}

#[test]
fn ranks_are_topologically_sound_and_layer_ordered() {
    let state = fixture();
    let mut deriver = Deriver::new();
    let derived = deriver.derive(&state).unwrap();

    for edge in derived.visible.edges() {
        assert!(
            derived.ranks[&edge.source] < derived.ranks[&edge.target],
            "rank inversion on {}",
            edge.id
        );
    }

    // Every raw-layer node ranks strictly before every model-layer node.
    let rank_of = |id: &str| derived.ranks[&NodeId::new(id)];
    for raw in ["ingest", "clean", "join"] {
        for model in ["features", "train"] {
            assert!(rank_of(raw) < rank_of(model), "{raw} !< {model}");
        }
    }

    assert_eq!(derived.bands.len(), 2);
    assert_eq!(derived.bands[0].name, "Raw");
    assert_eq!(derived.bands[1].name, "Model");
}

#[test]
fn hiding_layers_empties_ranks_and_bands() {
    let mut state = fixture();
    state.set_layers_visible(false);
    let mut deriver = Deriver::new();
    let derived = deriver.derive(&state).unwrap();

    assert!(derived.ranks.is_empty());
    assert!(derived.bands.is_empty());
}

#[test]
fn tag_filter_applies_the_opt_in_policy() {
    let mut state = fixture();
    state.set_tag_enabled(&TagId::new("etl"), true);
    let mut deriver = Deriver::new();

    // Untagged nodes disappear under any active tag filter, and so do nodes
    // whose tags all miss the filter.
    let ids = visible_ids(&mut deriver, &state);
    assert!(ids.contains(&"ingest".to_string()));
    assert!(ids.contains(&"clean".to_string()));
    assert!(!ids.contains(&"join".to_string()), "untagged node survived the filter");
    assert!(!ids.contains(&"train".to_string()), "ml-tagged node survived the etl filter");
}

#[test]
fn derivation_is_idempotent_and_memoized() {
    let state = fixture();
    let mut deriver = Deriver::new();

    let first = deriver.derive(&state).unwrap();
    let second = deriver.derive(&state).unwrap();

    assert!(Arc::ptr_eq(&first.visible, &second.visible));
    assert!(Arc::ptr_eq(&first.bands, &second.bands));
    assert!(Arc::ptr_eq(&first.ranks, &second.ranks));

    // Element-wise equality holds as well, trivially via identity.
    assert_eq!(first.visible.nodes(), second.visible.nodes());
    assert_eq!(first.visible.edges(), second.visible.edges());
}

#[test]
fn tag_hover_never_invalidates_derivation_caches() {
    let mut state = fixture();
    let mut deriver = Deriver::new();
    let before = deriver.visible_graph(&state);

    state.set_tag_active(&TagId::new("etl"), true);
    let after = deriver.visible_graph(&state);

    assert!(Arc::ptr_eq(&before, &after));
}

#[test]
fn slice_selection_does_not_invalidate_the_visible_graph() {
    let mut state = fixture();
    let mut deriver = Deriver::new();
    let before = deriver.visible_graph(&state);

    state.set_slice(Some(NodeId::new("ingest")), Some(NodeId::new("train")));
    let after = deriver.visible_graph(&state);
    assert!(Arc::ptr_eq(&before, &after));

    let sliced = deriver.sliced_nodes(&state);
    let expected: BTreeSet<NodeId> =
        ["ingest", "clean", "join", "features", "train"].iter().map(|s| NodeId::new(*s)).collect();
    assert_eq!(*sliced, expected);
}

#[test]
fn toggling_a_filter_invalidates_downstream_stages() {
    let mut state = fixture();
    let mut deriver = Deriver::new();
    let before = deriver.visible_graph(&state);

    state.set_node_disabled(&NodeId::new("features"), true);
    let after = deriver.visible_graph(&state);

    assert!(!Arc::ptr_eq(&before, &after));
    // The hidden node is bridged around.
    assert!(after.edges().iter().any(|e| e.id.as_str() == "join|train"));
}

#[test]
fn slicing_a_node_to_itself_returns_that_node() {
    let mut state = fixture();
    let mut deriver = Deriver::new();
    state.set_slice(Some(NodeId::new("clean")), Some(NodeId::new("clean")));

    let sliced = deriver.sliced_nodes(&state);
    assert_eq!(*sliced, [NodeId::new("clean")].into());
}

#[test]
fn slicing_disconnected_nodes_returns_exactly_the_pair() {
    let mut state = PipelineState::from_definition(PipelineDefinition {
        nodes: vec![node("a"), node("b"), node("m"), node("n")],
        edges: vec![edge("a", "b"), edge("m", "n")],
        ..PipelineDefinition::default()
    });
    state.set_slice(Some(NodeId::new("a")), Some(NodeId::new("n")));
    let mut deriver = Deriver::new();

    let sliced = deriver.sliced_nodes(&state);
    assert_eq!(*sliced, [NodeId::new("a"), NodeId::new("n")].into());
}

#[test]
fn sliced_dependencies_exclude_the_path_itself() {
    let mut state = fixture();
    state.set_slice(Some(NodeId::new("features")), Some(NodeId::new("train")));
    let mut deriver = Deriver::new();

    let deps = deriver.sliced_dependencies(&state);
    let expected: BTreeSet<NodeId> =
        ["ingest", "clean", "join"].iter().map(|s| NodeId::new(*s)).collect();
    assert_eq!(*deps, expected);
}

#[test]
fn linked_nodes_mark_the_center_false() {
    let mut state = fixture();
    state.set_focused(Some(NodeId::new("join")));
    let mut deriver = Deriver::new();

    let linked = deriver.linked_nodes(&state);
    assert_eq!(linked.get(&NodeId::new("join")), Some(&false));
    for id in ["ingest", "clean", "features", "train"] {
        assert_eq!(linked.get(&NodeId::new(id)), Some(&true), "missing {id}");
    }
}

#[test]
fn connectivity_survives_chains_of_disabled_nodes() {
    let mut state = PipelineState::from_definition(PipelineDefinition {
        nodes: vec![node("a"), node("b"), node("c"), node("d")],
        edges: vec![edge("a", "b"), edge("b", "c"), edge("c", "d")],
        ..PipelineDefinition::default()
    });
    state.set_node_disabled(&NodeId::new("b"), true);
    state.set_node_disabled(&NodeId::new("c"), true);
    let mut deriver = Deriver::new();

    assert_eq!(visible_ids(&mut deriver, &state), vec!["a", "d"]);
    assert_eq!(visible_edge_ids(&mut deriver, &state), vec!["a|d"]);
}

#[test]
fn cyclic_input_is_a_fatal_derivation_error() {
    let mut a = node("a");
    a.layer = Some("raw".to_string());
    let mut b = node("b");
    b.layer = Some("raw".to_string());
    let state = PipelineState::from_definition(PipelineDefinition {
        nodes: vec![a, b],
        edges: vec![edge("a", "b"), edge("b", "a")],
        layers: vec![LayerDef { id: "raw".to_string(), name: None }],
        ..PipelineDefinition::default()
    });
    let mut deriver = Deriver::new();

    match deriver.derive(&state) {
        Err(Error::CyclicDependencies { nodes }) => {
            assert_eq!(nodes, vec![NodeId::new("a"), NodeId::new("b")]);
        }
        other => panic!("expected a cycle error, got {other:?}"),
    }
}

#[test]
fn contraction_is_idempotent_across_repeated_toggles() {
    let mut state = {
        let mut x = node("X");
        x.modular_pipelines = vec!["P".to_string()];
        let mut y = node("Y");
        y.modular_pipelines = vec!["P".to_string()];
        PipelineState::from_definition(PipelineDefinition {
            nodes: vec![node("W"), x, y, node("Z")],
            edges: vec![edge("W", "X"), edge("X", "Y"), edge("Y", "Z")],
            ..PipelineDefinition::default()
        })
    };
    state.set_contracted(&ModularPipelineId::new("P"), true);
    let mut deriver = Deriver::new();
    let collapsed_nodes = visible_ids(&mut deriver, &state);
    let collapsed_edges = visible_edge_ids(&mut deriver, &state);

    // Expand and contract again: same output, element-wise.
    state.set_contracted(&ModularPipelineId::new("P"), false);
    let _ = deriver.visible_graph(&state);
    state.set_contracted(&ModularPipelineId::new("P"), true);

    assert_eq!(visible_ids(&mut deriver, &state), collapsed_nodes);
    assert_eq!(visible_edge_ids(&mut deriver, &state), collapsed_edges);
}
