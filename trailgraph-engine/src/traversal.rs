// Depth-first traversal over the navigation graph

use crate::graph::NavigationGraph;
use crate::record::VisitRecord;
use petgraph::graph::NodeIndex;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TraversalResult {
    pub root: Option<String>,
    /// Node keys in first-visit order, root first.
    pub order: Vec<String>,
}

impl TraversalResult {
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// DFS rooted at the node of the chronologically first record.
pub fn depth_first(graph: &NavigationGraph, records: &[VisitRecord]) -> TraversalResult {
    match records.first() {
        Some(first) => {
            let root = graph.key_of(first);
            depth_first_from(graph, &root).unwrap_or_default()
        }
        None => TraversalResult::default(),
    }
}

/// DFS from an arbitrary root; `None` when the root is not in the graph.
///
/// Successors are explored in edge insertion order and each node is emitted on
/// first entry. The walk keeps an explicit stack of (node, next successor)
/// frames, which yields the same order as the recursive definition.
pub fn depth_first_from(graph: &NavigationGraph, root: &str) -> Option<TraversalResult> {
    let start = graph.index_of(root)?;

    let mut visited = vec![false; graph.node_count()];
    let mut order = Vec::new();
    let mut stack: Vec<(Vec<NodeIndex>, usize)> = Vec::new();

    visited[start.index()] = true;
    order.push(graph.node(start).key.clone());
    stack.push((graph.successors(start), 0));

    while let Some((successors, next)) = stack.last_mut() {
        if *next >= successors.len() {
            stack.pop();
            continue;
        }

        let candidate = successors[*next];
        *next += 1;

        if visited[candidate.index()] {
            continue;
        }

        visited[candidate.index()] = true;
        order.push(graph.node(candidate).key.clone());
        stack.push((graph.successors(candidate), 0));
    }

    debug!("DFS from {} reached {} nodes", root, order.len());

    Some(TraversalResult {
        root: Some(root.to_string()),
        order,
    })
}
