//! Error types for flowviz CLI operations.

use std::io;
use thiserror::Error;

/// The error type for flowviz CLI operations.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The pipeline definition could not be parsed.
    #[error("invalid pipeline definition: {0}")]
    Definition(String),

    /// The view options file could not be parsed.
    #[error("invalid view options: {0}")]
    View(String),

    /// A command argument referenced something the pipeline does not define.
    #[error("unknown {entity}: {id}")]
    UnknownReference {
        /// What kind of thing was referenced (node, tag, ...).
        entity: &'static str,
        /// The offending identifier.
        id: String,
    },

    /// The derivation engine rejected the input.
    #[error(transparent)]
    Graph(#[from] flowviz_graph::Error),
}

/// A specialized Result type for flowviz operations.
pub type Result<T> = std::result::Result<T, Error>;
