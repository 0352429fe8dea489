//! CLI input validation functions.
//!
//! These validators are used by clap's `value_parser` attribute to validate
//! user input at parse time, providing immediate feedback for invalid values.

use flowviz_graph::domain::NodeKind;

/// Validate a node id argument.
///
/// Node ids are free-form except for `|`, which is reserved as the edge-id
/// separator, and surrounding whitespace, which is trimmed.
pub fn validate_node_id(s: &str) -> Result<String, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Node id cannot be empty".to_string());
    }
    if s.contains('|') {
        return Err("Node id cannot contain '|' (reserved as the edge id separator)".to_string());
    }
    Ok(s.to_string())
}

/// Validate a node kind argument (task, data, parameters, pipeline).
pub fn validate_kind(s: &str) -> Result<String, String> {
    let s = s.trim();
    s.parse::<NodeKind>().map(|kind| kind.as_str().to_string())
}

/// Validate a modular pipeline id: a dot-separated namespace with no empty
/// segments.
pub fn validate_group_id(s: &str) -> Result<String, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Modular pipeline id cannot be empty".to_string());
    }
    if s.contains('|') {
        return Err("Modular pipeline id cannot contain '|'".to_string());
    }
    if s.split('.').any(str::is_empty) {
        return Err(format!(
            "Invalid modular pipeline id '{s}': namespace segments cannot be empty"
        ));
    }
    Ok(s.to_string())
}
