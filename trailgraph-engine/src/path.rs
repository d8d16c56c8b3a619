// Minimum-hop paths between two nodes

use crate::error::{AnalysisError, Result};
use crate::graph::NavigationGraph;
use crate::record::VisitRecord;
use petgraph::graph::NodeIndex;
use serde::Serialize;
use std::collections::VecDeque;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PathResult {
    /// No records, so there is nothing to connect.
    Empty,
    Found {
        source: String,
        target: String,
        nodes: Vec<String>,
    },
    Unreachable {
        source: String,
        target: String,
    },
}

impl PathResult {
    /// Number of edges on the path, when there is one.
    pub fn hops(&self) -> Option<usize> {
        match self {
            PathResult::Found { nodes, .. } => Some(nodes.len().saturating_sub(1)),
            _ => None,
        }
    }

    pub fn nodes(&self) -> &[String] {
        match self {
            PathResult::Found { nodes, .. } => nodes,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoints {
    pub source: String,
    pub target: String,
}

/// Pick the path endpoints from the record stream.
///
/// The source is the node of the first record. The target is the node of the
/// last record whose node differs from the source; if there is none the
/// target is the source itself.
pub fn select_endpoints(graph: &NavigationGraph, records: &[VisitRecord]) -> Option<Endpoints> {
    let source = graph.key_of(records.first()?);
    let target = last_distinct_from(graph, records, &source);

    Some(Endpoints { source, target })
}

/// Key of the last record that does not map to `source`, or `source` itself.
pub fn last_distinct_from(graph: &NavigationGraph, records: &[VisitRecord], source: &str) -> String {
    records
        .iter()
        .rev()
        .map(|r| graph.key_of(r))
        .find(|key| key != source)
        .unwrap_or_else(|| source.to_string())
}

/// Shortest path using the default endpoint policy.
pub fn shortest_path(graph: &NavigationGraph, records: &[VisitRecord]) -> PathResult {
    match select_endpoints(graph, records) {
        Some(Endpoints { source, target }) => {
            // Both keys come from records the graph was built from.
            shortest_hops(graph, &source, &target).unwrap_or(PathResult::Unreachable { source, target })
        }
        None => PathResult::Empty,
    }
}

/// Breadth-first search from `source` to `target`, counting hops and ignoring
/// edge weights. Successors are expanded in insertion order and the first
/// discovery of a node fixes its predecessor.
pub fn shortest_hops(graph: &NavigationGraph, source: &str, target: &str) -> Result<PathResult> {
    let from = graph
        .index_of(source)
        .ok_or_else(|| AnalysisError::UnknownNode(source.to_string()))?;
    let to = graph
        .index_of(target)
        .ok_or_else(|| AnalysisError::UnknownNode(target.to_string()))?;

    if from == to {
        return Ok(PathResult::Found {
            source: source.to_string(),
            target: target.to_string(),
            nodes: vec![source.to_string()],
        });
    }

    let mut prev: Vec<Option<NodeIndex>> = vec![None; graph.node_count()];
    let mut seen = vec![false; graph.node_count()];
    let mut queue = VecDeque::new();

    seen[from.index()] = true;
    queue.push_back(from);

    while let Some(current) = queue.pop_front() {
        for next in graph.successors(current) {
            if seen[next.index()] {
                continue;
            }
            seen[next.index()] = true;
            prev[next.index()] = Some(current);

            if next == to {
                let nodes = reconstruct(graph, &prev, to);
                debug!("Shortest path {} -> {}: {} hops", source, target, nodes.len() - 1);
                return Ok(PathResult::Found {
                    source: source.to_string(),
                    target: target.to_string(),
                    nodes,
                });
            }

            queue.push_back(next);
        }
    }

    debug!("No path from {} to {}", source, target);
    Ok(PathResult::Unreachable {
        source: source.to_string(),
        target: target.to_string(),
    })
}

fn reconstruct(graph: &NavigationGraph, prev: &[Option<NodeIndex>], to: NodeIndex) -> Vec<String> {
    let mut path = vec![to];
    let mut current = to;
    while let Some(p) = prev[current.index()] {
        path.push(p);
        current = p;
    }
    path.reverse();
    path.into_iter().map(|idx| graph.node(idx).key.clone()).collect()
}
