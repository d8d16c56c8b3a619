use crate::report::Artifact;
use std::path::PathBuf;
use thiserror::Error;
use trailgraph_engine::AnalysisError;

/// Failure to render or persist a single artifact.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// One artifact that could not be written. Sibling artifacts are still
/// attempted.
#[derive(Error, Debug)]
#[error("failed to write {} to {}: {error}", artifact.file_name(), path.display())]
pub struct ArtifactWriteFailure {
    pub artifact: Artifact,
    pub path: PathBuf,
    #[source]
    pub error: ReportError,
}

/// Fatal run errors. Nothing is written when one of these is returned.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("cannot prepare output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
