//! Error types for the archive crate.

use std::path::PathBuf;

use zip::result::ZipError;

/// Errors raised while resolving inputs or packing diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("input does not exist: {0}")]
    NotFound(PathBuf),

    #[error("unsupported input {0}: expected a directory or a .zip/.jar archive")]
    Unsupported(PathBuf),

    #[error("failed to extract {path}: {source}")]
    Extract {
        path: PathBuf,
        #[source]
        source: ZipError,
    },

    #[error("failed to write archive {path}: {source}")]
    Pack {
        path: PathBuf,
        #[source]
        source: ZipError,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

impl ArchiveError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}

/// Convenience alias for archive results.
pub type ArchiveResult<T> = Result<T, ArchiveError>;
