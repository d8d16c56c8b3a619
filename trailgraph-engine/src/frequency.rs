// Visit, transition and repeated-path frequency tables

use crate::graph::{NavigationGraph, Transition};
use crate::record::VisitRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

pub const DEFAULT_WINDOW: usize = 3;
pub const DEFAULT_PATH_LIMIT: usize = 20;

/// Settings for frequent-path mining.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathMining {
    /// Number of consecutive nodes in one sequence.
    pub window: usize,
    /// Sequences seen fewer times than this are dropped.
    pub min_count: usize,
    /// Maximum number of rows kept; `None` keeps all of them.
    pub limit: Option<usize>,
}

impl Default for PathMining {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            min_count: 1,
            limit: Some(DEFAULT_PATH_LIMIT),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisitCount {
    pub url: String,
    pub title: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathFrequency {
    pub sequence: Vec<String>,
    pub count: usize,
}

impl PathFrequency {
    /// `a -> b -> c`
    pub fn label(&self) -> String {
        self.sequence.join(" -> ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FrequencyTables {
    pub visits: Vec<VisitCount>,
    pub transitions: Vec<Transition>,
    pub paths: Vec<PathFrequency>,
}

impl FrequencyTables {
    pub fn compute(graph: &NavigationGraph, records: &[VisitRecord], mining: &PathMining) -> Self {
        Self {
            visits: visit_counts(graph),
            transitions: transitions(graph),
            paths: frequent_paths(graph, records, mining),
        }
    }
}

/// Per-node visit totals, highest first. Ties keep first-seen order.
pub fn visit_counts(graph: &NavigationGraph) -> Vec<VisitCount> {
    let mut rows: Vec<VisitCount> = graph
        .nodes()
        .map(|node| VisitCount {
            url: node.key.clone(),
            title: node.title.clone(),
            count: node.total_visit_count,
        })
        .collect();

    rows.sort_by(|a, b| b.count.cmp(&a.count));
    rows
}

/// Per-edge transition counts, highest first. Ties keep insertion order.
pub fn transitions(graph: &NavigationGraph) -> Vec<Transition> {
    let mut rows = graph.transitions();
    rows.sort_by(|a, b| b.weight.cmp(&a.weight));
    rows
}

/// Count every run of `mining.window` consecutive node keys in the raw record
/// stream.
///
/// This works on the records rather than the graph because the graph only
/// keeps adjacency between direct neighbours. Ties keep the order in which
/// each sequence first appeared.
pub fn frequent_paths(
    graph: &NavigationGraph,
    records: &[VisitRecord],
    mining: &PathMining,
) -> Vec<PathFrequency> {
    if mining.window == 0 || records.len() < mining.window {
        return Vec::new();
    }

    let keys: Vec<String> = records.iter().map(|r| graph.key_of(r)).collect();

    let mut slots: HashMap<&[String], usize> = HashMap::new();
    let mut rows: Vec<PathFrequency> = Vec::new();

    for window in keys.windows(mining.window) {
        match slots.get(window) {
            Some(&slot) => rows[slot].count += 1,
            None => {
                slots.insert(window, rows.len());
                rows.push(PathFrequency {
                    sequence: window.to_vec(),
                    count: 1,
                });
            }
        }
    }

    let distinct = rows.len();
    rows.retain(|row| row.count >= mining.min_count);
    rows.sort_by(|a, b| b.count.cmp(&a.count));
    if let Some(limit) = mining.limit {
        rows.truncate(limit);
    }

    debug!(
        "Found {} distinct {}-node paths, keeping {}",
        distinct,
        mining.window,
        rows.len()
    );

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeKey;

    fn records(urls: &[&str]) -> Vec<VisitRecord> {
        urls.iter()
            .enumerate()
            .map(|(i, url)| VisitRecord::new(*url, format!("{} page", url), 1, i as i64))
            .collect()
    }

    fn all(window: usize) -> PathMining {
        PathMining {
            window,
            min_count: 1,
            limit: None,
        }
    }

    #[test]
    fn test_visit_counts_ranked_descending() {
        let input = vec![
            VisitRecord::new("A", "a", 3, 1),
            VisitRecord::new("B", "b", 10, 2),
            VisitRecord::new("A", "a", 4, 3),
            VisitRecord::new("C", "c", 7, 4),
        ];
        let graph = NavigationGraph::build(&input, NodeKey::Url);
        let rows = visit_counts(&graph);

        let ranked: Vec<(&str, u64)> = rows.iter().map(|r| (r.url.as_str(), r.count)).collect();
        assert_eq!(ranked, vec![("B", 10), ("A", 7), ("C", 7)]);
    }

    #[test]
    fn test_transitions_ranked_descending() {
        let input = records(&["A", "B", "A", "B", "C"]);
        let graph = NavigationGraph::build(&input, NodeKey::Url);
        let rows = transitions(&graph);

        assert_eq!(rows[0].from, "A");
        assert_eq!(rows[0].to, "B");
        assert_eq!(rows[0].weight, 2);
        assert_eq!(rows.len(), 3);
        assert_eq!((rows[1].from.as_str(), rows[1].to.as_str()), ("B", "A"));
        assert_eq!((rows[2].from.as_str(), rows[2].to.as_str()), ("B", "C"));
    }

    #[test]
    fn test_frequent_paths_counts_windows() {
        let input = records(&["A", "B", "C", "A", "B", "C", "D"]);
        let graph = NavigationGraph::build(&input, NodeKey::Url);
        let rows = frequent_paths(&graph, &input, &all(3));

        assert_eq!(rows[0].sequence, vec!["A", "B", "C"]);
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[0].label(), "A -> B -> C");
        // 5 windows, one repeated
        assert_eq!(rows.len(), 4);
        assert_eq!(rows.iter().map(|r| r.count).sum::<usize>(), 5);
    }

    #[test]
    fn test_frequent_paths_ties_keep_first_occurrence() {
        let input = records(&["A", "B", "C", "D"]);
        let graph = NavigationGraph::build(&input, NodeKey::Url);
        let rows = frequent_paths(&graph, &input, &all(2));

        let labels: Vec<String> = rows.iter().map(PathFrequency::label).collect();
        assert_eq!(labels, vec!["A -> B", "B -> C", "C -> D"]);
    }

    #[test]
    fn test_frequent_paths_window_longer_than_stream() {
        let input = records(&["A", "B"]);
        let graph = NavigationGraph::build(&input, NodeKey::Url);
        assert!(frequent_paths(&graph, &input, &all(3)).is_empty());
    }

    #[test]
    fn test_frequent_paths_min_count_and_limit() {
        let input = records(&["A", "B", "A", "B", "A", "C", "D"]);
        let graph = NavigationGraph::build(&input, NodeKey::Url);

        let recurring = PathMining {
            window: 2,
            min_count: 2,
            limit: None,
        };
        let rows = frequent_paths(&graph, &input, &recurring);
        let labels: Vec<String> = rows.iter().map(PathFrequency::label).collect();
        assert_eq!(labels, vec!["A -> B", "B -> A"]);

        let capped = PathMining {
            window: 2,
            min_count: 1,
            limit: Some(1),
        };
        assert_eq!(frequent_paths(&graph, &input, &capped).len(), 1);
    }

    #[test]
    fn test_frequent_paths_keep_self_loops() {
        let input = records(&["A", "A", "A", "A"]);
        let graph = NavigationGraph::build(&input, NodeKey::Url);
        let rows = frequent_paths(&graph, &input, &all(3));

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].count, 2);
    }

    #[test]
    fn test_frequent_paths_use_domain_keys() {
        let input = records(&[
            "https://a.test/1",
            "https://b.test/1",
            "https://a.test/2",
            "https://b.test/2",
        ]);
        let graph = NavigationGraph::build(&input, NodeKey::Domain);
        let rows = frequent_paths(&graph, &input, &all(2));

        assert_eq!(rows[0].label(), "a.test -> b.test");
        assert_eq!(rows[0].count, 2);
    }

    #[test]
    fn test_tables_empty_input() {
        let graph = NavigationGraph::build(&[], NodeKey::Url);
        let tables = FrequencyTables::compute(&graph, &[], &PathMining::default());
        assert_eq!(tables, FrequencyTables::default());
    }
}
