use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    /// A row (or the header) could not be turned into a visit record.
    #[error("malformed input at line {line}: {reason}")]
    MalformedInput { line: u64, reason: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("unknown node: {0}")]
    UnknownNode(String),

    #[error("analysis task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl AnalysisError {
    pub fn malformed(line: u64, reason: impl Into<String>) -> Self {
        AnalysisError::MalformedInput {
            line,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
