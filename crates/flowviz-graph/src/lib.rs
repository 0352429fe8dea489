//! Flowviz graph engine: derives the visible graph of a pipeline.
//!
//! Sitting between a normalized pipeline description and a renderer, this
//! crate turns the pipeline plus interactive view state (enabled tags and
//! node kinds, expanded/contracted modular pipelines, the slice selection)
//! into the data a layout engine consumes: the visible node and edge sets
//! (with synthetic edges preserving connectivity across hidden nodes), layer
//! bands, a topological rank per node, slices between two selected nodes,
//! and the ancestor/descendant closure of a focused node.
//!
//! All computation is synchronous and side-effect-free. Derivation is
//! memoized per stage on input identity, so repeated queries over unchanged
//! state are cheap and referentially stable; see [`graph::Deriver`].

#![forbid(unsafe_code)]

pub mod domain;
pub mod error;
pub mod graph;
pub mod state;

mod memo;

pub use error::{Error, Result};
pub use graph::{DerivedGraph, Deriver};
pub use state::{PipelineDefinition, PipelineState};
