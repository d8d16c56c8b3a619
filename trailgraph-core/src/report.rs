// Report artifacts rendered from one analysis run

use crate::error::{ArtifactWriteFailure, ReportError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, error, warn};
use trailgraph_engine::{
    Analysis, FrequencyTables, NavigationGraph, NodeKey, PathResult, TraversalResult, VisitRecord,
};

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n";

/// Seconds between 1601-01-01 (WebKit/Chrome epoch) and 1970-01-01.
const WEBKIT_EPOCH_OFFSET_SECS: i64 = 11_644_473_600;

const TOP_TRANSITIONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Artifact {
    Header,
    Summary,
    Dfs,
    Graph,
    ShortestPath,
    VisitCounts,
    Transitions,
    FrequentPaths,
    Dot,
    Json,
}

impl Artifact {
    /// Artifacts written on every run.
    pub const STANDARD: [Artifact; 9] = [
        Artifact::Header,
        Artifact::Summary,
        Artifact::Dfs,
        Artifact::Graph,
        Artifact::ShortestPath,
        Artifact::VisitCounts,
        Artifact::Transitions,
        Artifact::FrequentPaths,
        Artifact::Dot,
    ];

    /// Every artifact a run may leave in the output directory.
    pub const ALL: [Artifact; 10] = [
        Artifact::Header,
        Artifact::Summary,
        Artifact::Dfs,
        Artifact::Graph,
        Artifact::ShortestPath,
        Artifact::VisitCounts,
        Artifact::Transitions,
        Artifact::FrequentPaths,
        Artifact::Dot,
        Artifact::Json,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            Artifact::Header => "header.txt",
            Artifact::Summary => "summary.txt",
            Artifact::Dfs => "dfs_output.txt",
            Artifact::Graph => "graph.txt",
            Artifact::ShortestPath => "shortest_path.txt",
            Artifact::VisitCounts => "visit_counts.csv",
            Artifact::Transitions => "transitions.csv",
            Artifact::FrequentPaths => "frequent_paths.csv",
            Artifact::Dot => "browsing_graph.dot",
            Artifact::Json => "report.json",
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// How `visit_time` values are shown in text artifacts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeFormat {
    /// The integer as it appeared in the input.
    #[default]
    Raw,
    /// Microseconds since 1601-01-01 UTC, as Chromium history stores it.
    Webkit,
    /// Seconds since the Unix epoch.
    Unix,
}

impl TimeFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "raw" => Some(TimeFormat::Raw),
            "webkit" | "chrome" => Some(TimeFormat::Webkit),
            "unix" => Some(TimeFormat::Unix),
            _ => None,
        }
    }

    pub fn format(&self, timestamp: i64) -> String {
        use chrono::{DateTime, Utc};

        let datetime = match self {
            TimeFormat::Raw => None,
            TimeFormat::Webkit => {
                let secs = timestamp.div_euclid(1_000_000) - WEBKIT_EPOCH_OFFSET_SECS;
                let micros = timestamp.rem_euclid(1_000_000) as u32;
                DateTime::<Utc>::from_timestamp(secs, micros * 1_000)
            }
            TimeFormat::Unix => DateTime::<Utc>::from_timestamp(timestamp, 0),
        };

        match datetime {
            Some(dt) => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            None => timestamp.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdjacencyRow {
    pub key: String,
    pub title: String,
    pub neighbours: Vec<(String, u64)>,
}

/// Everything the renderers need, detached from the graph.
#[derive(Debug, Clone, Serialize)]
pub struct ReportData {
    pub record_count: usize,
    pub node_count: usize,
    pub edge_count: usize,
    pub node_key: NodeKey,
    pub first_visit: Option<i64>,
    pub last_visit: Option<i64>,
    #[serde(skip)]
    pub time_format: TimeFormat,
    pub adjacency: Vec<AdjacencyRow>,
    pub traversal: TraversalResult,
    pub shortest_path: PathResult,
    pub frequencies: FrequencyTables,
}

pub fn gather_report_data(
    graph: &NavigationGraph,
    records: &[VisitRecord],
    analysis: Analysis,
    time_format: TimeFormat,
) -> ReportData {
    let adjacency = graph
        .adjacency()
        .into_iter()
        .map(|(node, neighbours)| AdjacencyRow {
            key: node.key.clone(),
            title: node.title.clone(),
            neighbours: neighbours
                .into_iter()
                .map(|(to, weight)| (to.key.clone(), weight))
                .collect(),
        })
        .collect();

    ReportData {
        record_count: records.len(),
        node_count: graph.node_count(),
        edge_count: graph.edge_count(),
        node_key: graph.node_key(),
        first_visit: records.first().map(|r| r.visit_time),
        last_visit: records.last().map(|r| r.visit_time),
        time_format,
        adjacency,
        traversal: analysis.traversal,
        shortest_path: analysis.path,
        frequencies: analysis.frequencies,
    }
}

fn section(report: &mut String, title: &str) {
    report.push_str(RULE);
    report.push_str(title);
    report.push('\n');
    report.push_str(RULE);
    report.push('\n');
}

pub fn generate_header_report(data: &ReportData) -> String {
    let mut report = String::new();
    report.push_str(RULE);
    report.push_str("                         TRAILGRAPH BROWSING ANALYSIS\n");
    report.push_str(RULE);
    report.push('\n');

    report.push_str(&format!("Records:      {}\n", data.record_count));
    report.push_str(&format!("Nodes:        {}\n", data.node_count));
    report.push_str(&format!("Edges:        {}\n", data.edge_count));
    report.push_str(&format!("Grouped by:   {}\n", data.node_key.as_str()));

    if let (Some(first), Some(last)) = (data.first_visit, data.last_visit) {
        report.push_str(&format!("First visit:  {}\n", data.time_format.format(first)));
        report.push_str(&format!("Last visit:   {}\n", data.time_format.format(last)));
    }

    report
}

pub fn generate_summary_report(data: &ReportData) -> String {
    let mut report = String::new();
    section(&mut report, "BROWSING PATTERN SUMMARY");

    report.push_str(&format!("Unique {}s: {}\n", data.node_key.as_str(), data.node_count));

    match data.frequencies.visits.first() {
        Some(top) => {
            report.push_str(&format!("Most visited: {} ({} visits)", top.url, top.count));
            if !top.title.is_empty() {
                report.push_str(&format!(" - {}", top.title));
            }
            report.push('\n');
        }
        None => report.push_str("Most visited: (no visits)\n"),
    }

    match data.frequencies.transitions.first() {
        Some(jump) => report.push_str(&format!(
            "Most common jump: {} -> {} ({} times)\n",
            jump.from, jump.to, jump.weight
        )),
        None => report.push_str("Most common jump: (no transitions)\n"),
    }

    report.push('\n');
    report.push_str(&format!("Top {} transitions:\n", TOP_TRANSITIONS));
    if data.frequencies.transitions.is_empty() {
        report.push_str("  (none)\n");
    }
    for (idx, t) in data
        .frequencies
        .transitions
        .iter()
        .take(TOP_TRANSITIONS)
        .enumerate()
    {
        report.push_str(&format!("  {}. {} -> {} ({} times)\n", idx + 1, t.from, t.to, t.weight));
    }

    report
}

pub fn generate_dfs_report(data: &ReportData) -> String {
    let mut report = String::new();
    section(&mut report, "DEPTH-FIRST SEARCH");

    match data.traversal.root {
        Some(ref root) => {
            report.push_str(&format!("DFS from {}:\n", root));
            for node in &data.traversal.order {
                report.push_str(node);
                report.push('\n');
            }
        }
        None => report.push_str("No records to traverse.\n"),
    }

    report
}

pub fn generate_graph_report(data: &ReportData) -> String {
    let mut report = String::new();
    section(&mut report, "TRANSITION GRAPH");

    if data.adjacency.is_empty() {
        report.push_str("  (empty)\n");
    }

    for row in &data.adjacency {
        let neighbours = if row.neighbours.is_empty() {
            "(none)".to_string()
        } else {
            row.neighbours
                .iter()
                .map(|(to, weight)| format!("{}({})", to, weight))
                .collect::<Vec<_>>()
                .join(" ")
        };
        report.push_str(&format!("{} -> {}\n", row.key, neighbours));
    }

    report
}

pub fn generate_path_report(data: &ReportData) -> String {
    let mut report = String::new();
    section(&mut report, "SHORTEST PATH ANALYSIS");

    match &data.shortest_path {
        PathResult::Found {
            source,
            target,
            nodes,
        } => {
            report.push_str(&format!("Shortest path from {} to {}:\n", source, target));
            report.push_str(&nodes.join(" -> "));
            report.push('\n');
            report.push_str(&format!("Hops: {}\n", nodes.len().saturating_sub(1)));
        }
        PathResult::Unreachable { source, target } => {
            report.push_str(&format!("No path found from {} to {}\n", source, target));
        }
        PathResult::Empty => report.push_str("No records, no path to compute.\n"),
    }

    report
}

fn csv_to_string<F>(write_rows: F) -> Result<String, ReportError>
where
    F: FnOnce(&mut csv::Writer<Vec<u8>>) -> Result<(), csv::Error>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    write_rows(&mut writer)?;
    let bytes = writer
        .into_inner()
        .map_err(|e| ReportError::Io(e.into_error()))?;
    Ok(String::from_utf8(bytes)?)
}

pub fn generate_visits_csv(data: &ReportData) -> Result<String, ReportError> {
    csv_to_string(|w| {
        w.write_record(["url", "title", "count"])?;
        for row in &data.frequencies.visits {
            w.write_record([row.url.as_str(), row.title.as_str(), row.count.to_string().as_str()])?;
        }
        Ok(())
    })
}

pub fn generate_transitions_csv(data: &ReportData) -> Result<String, ReportError> {
    csv_to_string(|w| {
        w.write_record(["from", "to", "count"])?;
        for t in &data.frequencies.transitions {
            w.write_record([t.from.as_str(), t.to.as_str(), t.weight.to_string().as_str()])?;
        }
        Ok(())
    })
}

pub fn generate_paths_csv(data: &ReportData) -> Result<String, ReportError> {
    csv_to_string(|w| {
        w.write_record(["path", "count"])?;
        for p in &data.frequencies.paths {
            w.write_record([p.label(), p.count.to_string()])?;
        }
        Ok(())
    })
}

fn dot_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

pub fn generate_dot(data: &ReportData) -> String {
    let mut dot = String::from("digraph BrowsingGraph {\n");

    for row in &data.adjacency {
        let label = if row.title.is_empty() { &row.key } else { &row.title };
        dot.push_str(&format!(
            "\t\"{}\" [label=\"{}\"];\n",
            dot_escape(&row.key),
            dot_escape(label)
        ));
    }
    for row in &data.adjacency {
        for (to, weight) in &row.neighbours {
            dot.push_str(&format!(
                "\t\"{}\" -> \"{}\" [label={}];\n",
                dot_escape(&row.key),
                dot_escape(to),
                weight
            ));
        }
    }

    dot.push_str("}\n");
    dot
}

pub fn generate_json_report(data: &ReportData) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "trailgraph",
                "version": env!("CARGO_PKG_VERSION"),
                "format": "json"
            },
            "summary": {
                "records": data.record_count,
                "nodes": data.node_count,
                "edges": data.edge_count,
                "node_key": data.node_key.as_str(),
                "first_visit": data.first_visit,
                "last_visit": data.last_visit
            },
            "graph": data.adjacency,
            "traversal": data.traversal,
            "shortest_path": data.shortest_path,
            "visit_counts": data.frequencies.visits,
            "transitions": data.frequencies.transitions,
            "frequent_paths": data.frequencies.paths
        }
    });

    serde_json::to_string_pretty(&json_report)
}

/// Render one artifact to text.
pub fn render_artifact(artifact: Artifact, data: &ReportData) -> Result<String, ReportError> {
    Ok(match artifact {
        Artifact::Header => generate_header_report(data),
        Artifact::Summary => generate_summary_report(data),
        Artifact::Dfs => generate_dfs_report(data),
        Artifact::Graph => generate_graph_report(data),
        Artifact::ShortestPath => generate_path_report(data),
        Artifact::VisitCounts => generate_visits_csv(data)?,
        Artifact::Transitions => generate_transitions_csv(data)?,
        Artifact::FrequentPaths => generate_paths_csv(data)?,
        Artifact::Dot => generate_dot(data),
        Artifact::Json => generate_json_report(data)?,
    })
}

/// Write `content` to `path` through a temporary file in the same directory,
/// so `path` holds either its previous contents or the complete new ones.
pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(content.as_bytes())?;
    file.as_file().sync_all()?;
    file.persist(path)?;
    Ok(())
}

#[derive(Debug, Default)]
pub struct WriteSummary {
    pub written: Vec<PathBuf>,
    pub failures: Vec<ArtifactWriteFailure>,
}

impl WriteSummary {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Write each artifact into `dir`. A failure on one artifact is logged and
/// recorded; the remaining artifacts are still attempted.
pub fn write_artifacts(data: &ReportData, dir: &Path, artifacts: &[Artifact]) -> WriteSummary {
    let mut summary = WriteSummary::default();

    for &artifact in artifacts {
        let path = dir.join(artifact.file_name());
        let result = render_artifact(artifact, data)
            .and_then(|content| save_report(&content, &path).map_err(ReportError::from));

        match result {
            Ok(()) => {
                debug!("Wrote {}", path.display());
                summary.written.push(path);
            }
            Err(err) => {
                let failure = ArtifactWriteFailure {
                    artifact,
                    path,
                    error: err,
                };
                error!("{}", failure);
                summary.failures.push(failure);
            }
        }
    }

    summary
}

/// Delete artifacts left by an earlier run that this run does not produce,
/// such as a `report.json` from a run that had JSON enabled.
pub fn remove_stale_artifacts(dir: &Path, artifacts: &[Artifact]) -> Vec<PathBuf> {
    let mut removed = Vec::new();

    for artifact in Artifact::ALL {
        if artifacts.contains(&artifact) {
            continue;
        }
        let path = dir.join(artifact.file_name());
        if !path.is_file() {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("Removed stale {}", path.display());
                removed.push(path);
            }
            Err(err) => warn!("Could not remove stale {}: {}", path.display(), err),
        }
    }

    removed
}
