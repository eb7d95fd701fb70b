//! Error types for the variable engine.
//!
//! Cancellation is a first-class error, not an ordinary failure: any
//! catch-all handling inside the engine must check `is_cancelled` and
//! re-raise instead of swallowing it.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// The in-flight computation was cancelled by a newer request.
    /// Propagates immediately; partial results are discarded.
    #[error("operation cancelled")]
    Cancelled,

    #[error("failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("persisted index not found at {path}")]
    IndexNotFound { path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("failed to initialize watcher: {reason}")]
    WatchInit { reason: String },

    #[error("cannot watch path {path}: {reason}")]
    PathWatchFailed { path: PathBuf, reason: String },

    #[error("watch channel closed unexpectedly")]
    ChannelClosed,
}

impl EngineError {
    /// True for the cancellation signal, which must never be treated as
    /// an ordinary error by batch-level catch-alls.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, EngineError::Cancelled)
    }
}

impl From<figment::Error> for EngineError {
    fn from(e: figment::Error) -> Self {
        EngineError::Config(Box::new(e))
    }
}

impl From<notify::Error> for EngineError {
    fn from(e: notify::Error) -> Self {
        EngineError::WatchInit {
            reason: e.to_string(),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
