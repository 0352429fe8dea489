//! Error types for the derivation engine.

use crate::domain::NodeId;
use thiserror::Error;

/// The error type for derivation operations.
///
/// Most stages are total functions over well-formed input: missing references
/// are dropped and "not found"/"not connected" results are empty collections,
/// not errors. The one fatal condition is a cyclic dependency graph, which
/// violates the acyclicity precondition of rank assignment.
#[derive(Debug, Error)]
pub enum Error {
    /// The dependency graph contains a cycle, so the batching topological
    /// sort stalled before ranking every node.
    #[error("cyclic dependencies: {} nodes could not be ranked (first: {})", .nodes.len(), first_node(.nodes))]
    CyclicDependencies {
        /// Nodes left unranked when no source-free batch could be extracted.
        nodes: Vec<NodeId>,
    },
}

fn first_node(nodes: &[NodeId]) -> &str {
    nodes.first().map_or("<none>", NodeId::as_str)
}

/// A specialized Result type for derivation operations.
pub type Result<T> = std::result::Result<T, Error>;
