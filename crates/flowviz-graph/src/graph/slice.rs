//! Pipeline slicing between two selected nodes.
//!
//! A slice is the induced node set lying on a directed path between the
//! `from` and `to` endpoints of the current selection. Disconnected
//! endpoints are an expected interactive state, not an error: the result is
//! the bare endpoint pair, which tells the caller "nothing in between".

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::domain::{NodeId, SliceSelection};

use super::visible::VisibleGraph;

/// Compute the sliced node set for a selection.
///
/// - Neither endpoint set: empty.
/// - One endpoint set: just that endpoint (if visible).
/// - Both set and equal: that single node.
/// - Both set and connected: every node on the first directed path found.
/// - Both set and disconnected: exactly the endpoint pair.
///
/// Endpoints that do not resolve to visible nodes are dropped.
pub(crate) fn sliced_nodes(visible: &VisibleGraph, selection: &SliceSelection) -> BTreeSet<NodeId> {
    let present = |id: &Option<NodeId>| {
        id.as_ref().filter(|&n| visible.contains(n)).cloned()
    };
    let (from, to) = match (present(&selection.from), present(&selection.to)) {
        (Some(from), Some(to)) => (from, to),
        (endpoint, other) => return endpoint.into_iter().chain(other).collect(),
    };
    if from == to {
        return [from].into();
    }

    match find_path(visible, &from, &to) {
        Some(path) => path.into_iter().collect(),
        None => [from, to].into(),
    }
}

/// The extra upstream closure needed to execute a slice: every ancestor of
/// `to` that is not already on the sliced path.
pub(crate) fn sliced_dependencies(
    visible: &VisibleGraph,
    selection: &SliceSelection,
) -> BTreeSet<NodeId> {
    let Some(to) = selection.to.as_ref().filter(|&n| visible.contains(n)) else {
        return BTreeSet::new();
    };
    let path = sliced_nodes(visible, selection);

    let mut ancestors = BTreeSet::new();
    let mut stack = vec![to.clone()];
    let mut seen: HashSet<NodeId> = [to.clone()].into();
    while let Some(node) = stack.pop() {
        for pred in visible.predecessors(&node) {
            if seen.insert(pred.clone()) {
                ancestors.insert(pred.clone());
                stack.push(pred);
            }
        }
    }

    ancestors.difference(&path).cloned().collect()
}

/// First directed path from `from` to `to`, by iterative depth-first search.
/// Not necessarily the shortest path, but deterministic: successors are
/// explored in id order.
fn find_path(visible: &VisibleGraph, from: &NodeId, to: &NodeId) -> Option<Vec<NodeId>> {
    let mut parent: HashMap<NodeId, NodeId> = HashMap::new();
    let mut visited: HashSet<NodeId> = [from.clone()].into();
    let mut stack = vec![from.clone()];

    'search: while let Some(node) = stack.pop() {
        // Reverse id order on the stack makes the DFS explore ascending ids.
        for succ in visible.successors(&node).into_iter().rev() {
            if !visited.insert(succ.clone()) {
                continue;
            }
            parent.insert(succ.clone(), node.clone());
            if succ == *to {
                break 'search;
            }
            stack.push(succ);
        }
    }

    if !parent.contains_key(to) {
        return None;
    }
    let mut path = vec![to.clone()];
    let mut cursor = to;
    while let Some(prev) = parent.get(cursor) {
        path.push(prev.clone());
        cursor = prev;
    }
    path.reverse();
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use crate::state::LayerCatalog;

    use super::super::disabled::resolve;
    use super::super::working::testing::working_set;

    fn visible(nodes: &[&str], edges: &[(&str, &str)]) -> VisibleGraph {
        let ws = working_set(nodes, edges);
        let disabled = resolve(
            &ws,
            &BTreeSet::new(),
            &BTreeSet::new(),
            &BTreeSet::new(),
            None,
            &BTreeSet::new(),
            &BTreeSet::new(),
            &LayerCatalog::default(),
        );
        VisibleGraph::build(&ws, &disabled)
    }

    fn select(from: Option<&str>, to: Option<&str>) -> SliceSelection {
        SliceSelection {
            from: from.map(NodeId::new),
            to: to.map(NodeId::new),
        }
    }

    fn ids(set: &BTreeSet<NodeId>) -> Vec<&str> {
        set.iter().map(NodeId::as_str).collect()
    }

    #[test]
    fn unset_endpoints_return_whatever_is_set() {
        let g = visible(&["a", "b"], &[("a", "b")]);
        assert!(sliced_nodes(&g, &select(None, None)).is_empty());
        assert_eq!(ids(&sliced_nodes(&g, &select(Some("a"), None))), vec!["a"]);
        assert_eq!(ids(&sliced_nodes(&g, &select(None, Some("b")))), vec!["b"]);
    }

    #[test]
    fn same_endpoint_slices_to_itself() {
        let g = visible(&["a", "b"], &[("a", "b")]);
        assert_eq!(ids(&sliced_nodes(&g, &select(Some("a"), Some("a")))), vec!["a"]);
    }

    #[test]
    fn connected_endpoints_return_the_path() {
        let g = visible(
            &["a", "b", "c", "d", "side"],
            &[("a", "b"), ("b", "c"), ("c", "d"), ("side", "c")],
        );
        assert_eq!(
            ids(&sliced_nodes(&g, &select(Some("a"), Some("d")))),
            vec!["a", "b", "c", "d"]
        );
    }

    #[test]
    fn disconnected_endpoints_return_exactly_the_pair() {
        let g = visible(&["a", "b", "m", "n"], &[("a", "b"), ("m", "n")]);
        assert_eq!(
            ids(&sliced_nodes(&g, &select(Some("a"), Some("n")))),
            vec!["a", "n"]
        );
        // Reversed selection relative to edge direction is also disconnected.
        assert_eq!(
            ids(&sliced_nodes(&g, &select(Some("b"), Some("a")))),
            vec!["a", "b"]
        );
    }

    #[test]
    fn missing_endpoints_are_dropped() {
        let g = visible(&["a"], &[]);
        assert!(sliced_nodes(&g, &select(Some("ghost"), None)).is_empty());
        assert_eq!(
            ids(&sliced_nodes(&g, &select(Some("ghost"), Some("a")))),
            vec!["a"]
        );
    }

    #[test]
    fn dependencies_are_ancestors_off_the_path() {
        // upstream -> a -> b -> c, with `extra -> b` feeding the path from
        // outside and `c -> down` irrelevant downstream.
        let g = visible(
            &["upstream", "a", "b", "c", "extra", "down"],
            &[
                ("upstream", "a"),
                ("a", "b"),
                ("b", "c"),
                ("extra", "b"),
                ("c", "down"),
            ],
        );
        let deps = sliced_dependencies(&g, &select(Some("a"), Some("c")));
        assert_eq!(ids(&deps), vec!["extra", "upstream"]);
    }

    #[test]
    fn dependencies_empty_without_a_target() {
        let g = visible(&["a", "b"], &[("a", "b")]);
        assert!(sliced_dependencies(&g, &select(Some("a"), None)).is_empty());
    }
}
