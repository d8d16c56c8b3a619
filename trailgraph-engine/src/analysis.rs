use crate::error::{AnalysisError, Result};
use crate::frequency::{FrequencyTables, PathMining};
use crate::graph::{NavigationGraph, NodeKey};
use crate::path::{self, Endpoints, PathResult};
use crate::record::VisitRecord;
use crate::traversal::{self, TraversalResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Knobs for one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    pub node_key: NodeKey,
    pub mining: PathMining,
    /// DFS root and path source; defaults to the first record's node.
    pub source: Option<String>,
    /// Path target; defaults to the last record not mapping to the source.
    pub target: Option<String>,
}

impl AnalysisOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_node_key(mut self, node_key: NodeKey) -> Self {
        self.node_key = node_key;
        self
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.mining.window = window;
        self
    }

    pub fn with_min_count(mut self, min_count: usize) -> Self {
        self.mining.min_count = min_count;
        self
    }

    pub fn with_path_limit(mut self, limit: Option<usize>) -> Self {
        self.mining.limit = limit;
        self
    }

    pub fn with_source(mut self, source: Option<String>) -> Self {
        self.source = source;
        self
    }

    pub fn with_target(mut self, target: Option<String>) -> Self {
        self.target = target;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.mining.window == 0 {
            return Err(AnalysisError::Config(
                "frequent-path window must be at least 1".to_string(),
            ));
        }
        if self.mining.min_count == 0 {
            return Err(AnalysisError::Config(
                "frequent-path minimum count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve the DFS root and path endpoints against a built graph.
    ///
    /// Returns `None` when there are no records and nothing was requested
    /// explicitly. Explicit keys that are not in the graph are an error.
    pub fn resolve_endpoints(
        &self,
        graph: &NavigationGraph,
        records: &[VisitRecord],
    ) -> Result<Option<Endpoints>> {
        let source = match (&self.source, records.first()) {
            (Some(source), _) => source.clone(),
            (None, Some(first)) => graph.key_of(first),
            (None, None) => {
                return match &self.target {
                    Some(target) => Err(AnalysisError::UnknownNode(target.clone())),
                    None => Ok(None),
                };
            }
        };

        let target = match &self.target {
            Some(target) => target.clone(),
            None => path::last_distinct_from(graph, records, &source),
        };

        for key in [&source, &target] {
            if graph.index_of(key).is_none() {
                return Err(AnalysisError::UnknownNode(key.clone()));
            }
        }

        Ok(Some(Endpoints { source, target }))
    }
}

/// Everything derived from one graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Analysis {
    pub traversal: TraversalResult,
    pub path: PathResult,
    pub frequencies: FrequencyTables,
}

/// Run traversal, path search and frequency analytics side by side.
///
/// The three stages only read the graph and records, so each runs on its own
/// blocking task and they are joined before returning.
pub async fn analyze(
    graph: Arc<NavigationGraph>,
    records: Arc<[VisitRecord]>,
    options: &AnalysisOptions,
) -> Result<Analysis> {
    options.validate()?;
    let endpoints = options.resolve_endpoints(&graph, &records)?;
    if let Some(ref e) = endpoints {
        debug!("Endpoints: {} -> {}", e.source, e.target);
    }

    let traversal_task = {
        let graph = graph.clone();
        let root = endpoints.as_ref().map(|e| e.source.clone());
        tokio::task::spawn_blocking(move || match root {
            Some(root) => traversal::depth_first_from(&graph, &root)
                .ok_or(AnalysisError::UnknownNode(root)),
            None => Ok(TraversalResult::default()),
        })
    };

    let path_task = {
        let graph = graph.clone();
        let endpoints = endpoints.clone();
        tokio::task::spawn_blocking(move || match endpoints {
            Some(Endpoints { source, target }) => path::shortest_hops(&graph, &source, &target),
            None => Ok(PathResult::Empty),
        })
    };

    let frequency_task = {
        let graph = graph.clone();
        let records = records.clone();
        let mining = options.mining.clone();
        tokio::task::spawn_blocking(move || FrequencyTables::compute(&graph, &records, &mining))
    };

    let (traversal, path, frequencies) =
        tokio::try_join!(traversal_task, path_task, frequency_task)?;
    let traversal = traversal?;
    let path = path?;

    info!(
        "Analysis complete: {} nodes traversed, {} transitions, {} frequent paths",
        traversal.order.len(),
        frequencies.transitions.len(),
        frequencies.paths.len()
    );

    Ok(Analysis {
        traversal,
        path,
        frequencies,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(urls: &[&str]) -> Vec<VisitRecord> {
        urls.iter()
            .enumerate()
            .map(|(i, url)| VisitRecord::new(*url, "", 1, i as i64))
            .collect()
    }

    async fn run(urls: &[&str], options: AnalysisOptions) -> Result<Analysis> {
        let input = records(urls);
        let graph = Arc::new(NavigationGraph::build(&input, options.node_key));
        analyze(graph, input.into(), &options).await
    }

    #[tokio::test]
    async fn test_analyze_a_b_a() {
        let analysis = run(&["A", "B", "A"], AnalysisOptions::new()).await.unwrap();

        assert_eq!(analysis.traversal.order, vec!["A", "B"]);
        assert_eq!(analysis.path.nodes(), ["A", "B"]);
        assert_eq!(analysis.frequencies.transitions.len(), 2);
        assert_eq!(analysis.frequencies.paths.len(), 1);
    }

    #[tokio::test]
    async fn test_analyze_empty() {
        let analysis = run(&[], AnalysisOptions::new()).await.unwrap();

        assert!(analysis.traversal.is_empty());
        assert_eq!(analysis.path, PathResult::Empty);
        assert_eq!(analysis.frequencies, FrequencyTables::default());
    }

    #[tokio::test]
    async fn test_analyze_explicit_endpoints() {
        let options = AnalysisOptions::new()
            .with_source(Some("C".to_string()))
            .with_target(Some("A".to_string()));
        let analysis = run(&["A", "B", "C"], options).await.unwrap();

        assert_eq!(analysis.traversal.order, vec!["C"]);
        assert!(matches!(analysis.path, PathResult::Unreachable { .. }));
    }

    #[tokio::test]
    async fn test_analyze_explicit_source_picks_default_target() {
        let options = AnalysisOptions::new().with_source(Some("B".to_string()));
        let analysis = run(&["A", "B", "C", "B"], options).await.unwrap();

        assert_eq!(analysis.path.nodes(), ["B", "C"]);
    }

    #[tokio::test]
    async fn test_analyze_unknown_endpoint() {
        let options = AnalysisOptions::new().with_target(Some("Z".to_string()));
        let err = run(&["A", "B"], options).await.unwrap_err();
        assert!(matches!(err, AnalysisError::UnknownNode(ref key) if key == "Z"));

        let options = AnalysisOptions::new().with_target(Some("Z".to_string()));
        let err = run(&[], options).await.unwrap_err();
        assert!(matches!(err, AnalysisError::UnknownNode(_)));
    }

    #[tokio::test]
    async fn test_analyze_rejects_zero_window() {
        let err = run(&["A"], AnalysisOptions::new().with_window(0)).await.unwrap_err();
        assert!(matches!(err, AnalysisError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_zero_min_count() {
        assert!(AnalysisOptions::new().with_min_count(0).validate().is_err());
        assert!(AnalysisOptions::new().validate().is_ok());
    }
}
