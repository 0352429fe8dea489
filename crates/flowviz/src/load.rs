//! Loading pipeline definitions from disk.

use std::fs;
use std::path::Path;

use flowviz_graph::{PipelineDefinition, PipelineState};

use crate::error::{Error, Result};

/// Load a pipeline definition (JSON) and normalize it into derivable state.
///
/// # Errors
///
/// [`Error::Io`] when the file cannot be read, [`Error::Definition`] when it
/// is not a valid pipeline definition. Records with missing references do
/// not fail the load; the normalizer drops them with a warning.
pub fn load_state(path: &Path) -> Result<PipelineState> {
    let text = fs::read_to_string(path)?;
    let definition: PipelineDefinition = serde_json::from_str(&text)
        .map_err(|e| Error::Definition(format!("{}: {e}", path.display())))?;

    tracing::debug!(path = %path.display(), "loaded pipeline definition");
    Ok(PipelineState::from_definition(definition))
}
