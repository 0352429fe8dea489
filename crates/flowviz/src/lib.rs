//! Flowviz - pipeline graph derivation at the command line.
//!
//! This crate wraps the [`flowviz_graph`] engine in a CLI: it loads a
//! pipeline definition from JSON, applies view toggles given as flags or as
//! a YAML view file, runs the derivation, and prints the visible graph,
//! slices, or linked-node closures as text or JSON.

#![forbid(unsafe_code)]

// Public modules for library usage
pub mod error;
pub mod load;
pub mod view;

// Public CLI module (needed by binary)
pub mod cli;

// Output formatting
pub mod output;
