//! Error types for the diff crate.

use std::path::PathBuf;

/// Errors that abort a differencing run.
///
/// Per-entry problems (missing counterparts, unreadable or undecodable
/// class files, diagnostics write failures) never surface here; they end up
/// in the [`DiffReport`](crate::DiffReport) instead.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// A root handed to the engine is not an existing directory.
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The original tree could not be enumerated.
    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// The diagnostics directory could not be prepared.
    #[error(transparent)]
    Record(#[from] RecordError),

    /// A comparison task panicked or was cancelled.
    #[error("comparison worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    /// The worker pool semaphore was closed.
    #[error("worker pool closed: {0}")]
    WorkerPool(#[from] tokio::sync::AcquireError),
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;

/// Failure to persist a diagnostic artifact.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("failed to prepare diagnostics directory {path}: {source}")]
    Prepare {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience alias for recorder results.
pub type RecordResult<T> = Result<T, RecordError>;

/// The disassembler could not turn a compiled unit into text.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct DisassemblyFailure {
    pub reason: String,
}

impl DisassemblyFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}
