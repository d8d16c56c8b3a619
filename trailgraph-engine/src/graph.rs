// Navigation graph built from the chronological visit stream

use crate::record::VisitRecord;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;
use url::Url;

/// What a graph node stands for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKey {
    /// One node per distinct url.
    #[default]
    Url,
    /// One node per url host; urls without a host keep their full text.
    Domain,
}

impl NodeKey {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "url" => Some(NodeKey::Url),
            "domain" | "host" => Some(NodeKey::Domain),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKey::Url => "url",
            NodeKey::Domain => "domain",
        }
    }

    pub fn key_for(&self, url: &str) -> String {
        match self {
            NodeKey::Url => url.to_string(),
            NodeKey::Domain => extract_domain(url).unwrap_or_else(|| url.to_string()),
        }
    }
}

/// Host part of a url, if it has one.
pub fn extract_domain(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageNode {
    pub key: String,
    /// Title of the most recent record mapped to this node.
    pub title: String,
    pub total_visit_count: u64,
}

/// A directed transition between two nodes, as seen from the outside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub from: String,
    pub to: String,
    pub weight: u64,
}

/// Directed, weighted graph of page-to-page moves.
///
/// Nodes are indexed in the order their key first appears in the record
/// stream and edges in the order the (from, to) pair first occurs. Both orders
/// are part of the graph's contract: traversal and ranking rely on them.
#[derive(Debug, Clone)]
pub struct NavigationGraph {
    graph: DiGraph<PageNode, u64>,
    index: HashMap<String, NodeIndex>,
    node_key: NodeKey,
    record_count: usize,
}

impl NavigationGraph {
    /// Build the graph in a single pass over `records`.
    pub fn build(records: &[VisitRecord], node_key: NodeKey) -> Self {
        let mut graph = NavigationGraph {
            graph: DiGraph::new(),
            index: HashMap::new(),
            node_key,
            record_count: records.len(),
        };

        let mut previous: Option<NodeIndex> = None;
        for record in records {
            let current = graph.observe(record);
            if let Some(from) = previous {
                graph.bump_edge(from, current);
            }
            previous = Some(current);
        }

        debug!(
            "Built graph with {} nodes and {} edges from {} records",
            graph.node_count(),
            graph.edge_count(),
            records.len()
        );

        graph
    }

    fn observe(&mut self, record: &VisitRecord) -> NodeIndex {
        let key = self.node_key.key_for(&record.url);
        let idx = match self.index.get(&key) {
            Some(&idx) => idx,
            None => {
                let idx = self.graph.add_node(PageNode {
                    key: key.clone(),
                    title: String::new(),
                    total_visit_count: 0,
                });
                self.index.insert(key, idx);
                idx
            }
        };

        let node = &mut self.graph[idx];
        node.title = record.title.clone();
        node.total_visit_count += record.visit_count;
        idx
    }

    fn bump_edge(&mut self, from: NodeIndex, to: NodeIndex) {
        match self.graph.find_edge(from, to) {
            Some(edge) => self.graph[edge] += 1,
            None => {
                self.graph.add_edge(from, to, 1);
            }
        }
    }

    pub fn node_key(&self) -> NodeKey {
        self.node_key
    }

    pub fn record_count(&self) -> usize {
        self.record_count
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Sum of all edge weights; `record_count - 1` for a non-empty stream.
    pub fn total_weight(&self) -> u64 {
        self.graph.edge_weights().sum()
    }

    /// Node key a record maps to in this graph.
    pub fn key_of(&self, record: &VisitRecord) -> String {
        self.node_key.key_for(&record.url)
    }

    pub fn index_of(&self, key: &str) -> Option<NodeIndex> {
        self.index.get(key).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> &PageNode {
        &self.graph[idx]
    }

    pub fn get(&self, key: &str) -> Option<&PageNode> {
        self.index_of(key).map(|idx| &self.graph[idx])
    }

    /// Nodes in first-seen order.
    pub fn nodes(&self) -> impl Iterator<Item = &PageNode> {
        self.graph.node_weights()
    }

    /// Weight of the `from -> to` edge, 0 when absent.
    pub fn weight(&self, from: &str, to: &str) -> u64 {
        match (self.index_of(from), self.index_of(to)) {
            (Some(a), Some(b)) => self
                .graph
                .find_edge(a, b)
                .map(|e| self.graph[e])
                .unwrap_or(0),
            _ => 0,
        }
    }

    /// Successors of `idx` in edge insertion order.
    ///
    /// petgraph hands out outgoing edges newest first, so they are re-sorted by
    /// edge index, which grows with insertion.
    pub fn successors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut edges: Vec<(EdgeIndex, NodeIndex)> = self
            .graph
            .edges(idx)
            .map(|edge| (edge.id(), edge.target()))
            .collect();
        edges.sort_by_key(|(id, _)| *id);
        edges.into_iter().map(|(_, target)| target).collect()
    }

    /// Every edge in insertion order.
    pub fn transitions(&self) -> Vec<Transition> {
        self.graph
            .edge_references()
            .map(|edge| Transition {
                from: self.graph[edge.source()].key.clone(),
                to: self.graph[edge.target()].key.clone(),
                weight: *edge.weight(),
            })
            .collect()
    }

    /// Adjacency listing: each node with its (successor, weight) pairs, both in
    /// insertion order. Nodes without outgoing edges are included.
    pub fn adjacency(&self) -> Vec<(&PageNode, Vec<(&PageNode, u64)>)> {
        self.graph
            .node_indices()
            .map(|idx| {
                let neighbours = self
                    .successors(idx)
                    .into_iter()
                    .map(|to| {
                        let weight = self
                            .graph
                            .find_edge(idx, to)
                            .map(|e| self.graph[e])
                            .unwrap_or(0);
                        (&self.graph[to], weight)
                    })
                    .collect();
                (&self.graph[idx], neighbours)
            })
            .collect()
    }
}
