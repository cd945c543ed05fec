//! Output-subsystem error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("feature is missing required property '{0}'")]
    MissingProperty(String),

    #[error("edge references unknown node '{0}'")]
    UnknownNode(String),

    #[error("degenerate geometry: {0}")]
    Degenerate(String),
}

pub type OutputResult<T> = Result<T, OutputError>;
