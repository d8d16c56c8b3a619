use crate::error::RunError;
use crate::report::{
    Artifact, TimeFormat, WriteSummary, gather_report_data, remove_stale_artifacts, write_artifacts,
};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use trailgraph_engine::{AnalysisOptions, NavigationGraph, VisitRecord, analyze, load_records};

/// Options for configuring one run
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub analysis: AnalysisOptions,
    pub time_format: TimeFormat,
    /// Also write `report.json`
    pub emit_json: bool,
}

impl RunOptions {
    pub fn new(input: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output_dir: output_dir.into(),
            analysis: AnalysisOptions::default(),
            time_format: TimeFormat::default(),
            emit_json: false,
        }
    }

    /// Artifacts this run will write, in write order
    pub fn artifacts(&self) -> Vec<Artifact> {
        let mut artifacts = Artifact::STANDARD.to_vec();
        if self.emit_json {
            artifacts.push(Artifact::Json);
        }
        artifacts
    }
}

/// Callback for reporting run progress
pub type RunProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

#[derive(Debug)]
pub struct RunOutcome {
    pub output_dir: PathBuf,
    pub record_count: usize,
    pub node_count: usize,
    pub edge_count: usize,
    pub writes: WriteSummary,
}

impl RunOutcome {
    /// True when every artifact made it to disk.
    pub fn is_complete(&self) -> bool {
        self.writes.is_complete()
    }
}

/// Execute a full run: load, build, analyze, write.
///
/// Loader, builder and analysis failures return early with nothing written.
/// Once analysis succeeds every artifact is attempted; write failures are
/// reported in the outcome rather than as an error. Artifacts an earlier run
/// left behind that this run does not produce are removed.
pub async fn execute_run(
    options: RunOptions,
    progress_callback: Option<RunProgressCallback>,
) -> Result<RunOutcome, RunError> {
    let artifacts = options.artifacts();
    let RunOptions {
        input,
        output_dir,
        analysis,
        time_format,
        ..
    } = options;

    let report = |msg: String| {
        if let Some(ref callback) = progress_callback {
            callback(msg);
        }
    };

    analysis.validate()?;

    report(format!("Loading {}", input.display()));
    let records: Arc<[VisitRecord]> = load_records(&input)?.into();

    report(format!("Building graph from {} records", records.len()));
    let graph = Arc::new(NavigationGraph::build(&records, analysis.node_key));
    info!(
        "Graph built: {} nodes, {} edges",
        graph.node_count(),
        graph.edge_count()
    );

    report("Analyzing".to_string());
    let result = analyze(graph.clone(), records.clone(), &analysis).await?;

    fs::create_dir_all(&output_dir).map_err(|source| RunError::OutputDir {
        path: output_dir.clone(),
        source,
    })?;

    report(format!("Writing artifacts to {}", output_dir.display()));
    let data = gather_report_data(&graph, &records, result, time_format);
    let writes = write_artifacts(&data, &output_dir, &artifacts);
    remove_stale_artifacts(&output_dir, &artifacts);

    info!(
        "Run complete: {} artifacts written, {} failed",
        writes.written.len(),
        writes.failures.len()
    );

    Ok(RunOutcome {
        output_dir,
        record_count: records.len(),
        node_count: graph.node_count(),
        edge_count: graph.edge_count(),
        writes,
    })
}
