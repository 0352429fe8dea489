//! Linked-node highlighting.
//!
//! Given one focused node, computes the full set of ancestors and
//! descendants reachable over visible edges. Callers fade everything absent
//! from the map, highlight entries marked `true`, and style the focused node
//! itself (present but `false`) as the center of the selection.

use std::collections::BTreeMap;

use crate::domain::NodeId;

use super::visible::VisibleGraph;

/// Mark every node linked to `focused` through visible edges.
///
/// Returns an empty map when nothing is focused (or the focused id is not
/// visible). Otherwise linked neighbors map to `true` and the focused node
/// itself to `false`.
pub(crate) fn linked_nodes(
    visible: &VisibleGraph,
    focused: Option<&NodeId>,
) -> BTreeMap<NodeId, bool> {
    let Some(focused) = focused.filter(|&n| visible.contains(n)) else {
        return BTreeMap::new();
    };

    let mut linked = BTreeMap::new();
    for forward in [true, false] {
        let mut stack = vec![focused.clone()];
        while let Some(node) = stack.pop() {
            let neighbors = if forward {
                visible.successors(&node)
            } else {
                visible.predecessors(&node)
            };
            for neighbor in neighbors {
                if linked.insert(neighbor.clone(), true).is_none() {
                    stack.push(neighbor);
                }
            }
        }
    }

    // The center is present but distinguished from its neighbors.
    linked.insert(focused.clone(), false);
    linked
}
