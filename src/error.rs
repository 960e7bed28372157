//! Error types shared by the calibration and TMDD modules.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a run before any output is written.
#[derive(Debug, Error)]
pub enum CorrectionError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error on {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {}: {}", .path.display(), .source)]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl CorrectionError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Alias for `Result<T, CorrectionError>`.
pub type CorrectionResult<T> = Result<T, CorrectionError>;
