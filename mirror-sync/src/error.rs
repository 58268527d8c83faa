//! Error types for mirror-sync.

use std::path::PathBuf;

use thiserror::Error;

use mirror_core::error::RegistryError;

/// All errors that can arise from sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An error from the profile registry.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A copy or move target is, contains, or lies beneath a destination file
    /// that the plan keeps, or belongs to a cycle of moves.
    #[error("destination collision: {path} overlaps a file that would not be moved or deleted first")]
    DestinationCollision { path: PathBuf },

    /// A sync root exists but is not a directory.
    #[error("not a directory: {path}")]
    NotADirectory { path: PathBuf },
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
