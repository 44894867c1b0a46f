//! Collector error taxonomy

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by price sources and sample stores
///
/// Every variant is recoverable from the engine's point of view: it is
/// logged with context and the next cycle proceeds.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// Connection, timeout or body-read failure
    #[error("transport error: {0}")]
    Transport(String),
    /// Non-success status or unparseable payload
    #[error("upstream error: {0}")]
    Upstream(String),
    /// Requested asset absent from an otherwise successful response
    #[error("asset {0} not found in response")]
    NotFound(String),
    /// Record could not be encoded or written
    #[error("persistence error at {path:?}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CollectorError {
    /// Stable label for log fields and metric labels
    pub fn kind(&self) -> &'static str {
        match self {
            CollectorError::Transport(_) => "transport",
            CollectorError::Upstream(_) => "upstream",
            CollectorError::NotFound(_) => "not_found",
            CollectorError::Persistence { .. } => "persistence",
        }
    }

    /// Whether the error came from the price source side
    pub fn is_source_error(&self) -> bool {
        !matches!(self, CollectorError::Persistence { .. })
    }

    pub(crate) fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CollectorError::Persistence {
            path: path.into(),
            source,
        }
    }
}

impl From<reqwest::Error> for CollectorError {
    fn from(e: reqwest::Error) -> Self {
        CollectorError::Transport(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CollectorError>;
