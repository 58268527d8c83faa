//! Error types for mirror-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from profile registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Underlying I/O failure (file not found, permission denied, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error (write/save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Malformed profile YAML, with the file path and serde_yaml's line context.
    #[error("failed to parse profile at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`, so `~/.mirror/` cannot be located.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    /// No profile file exists for the requested name.
    #[error("profile '{name}' not found at {path}")]
    ProfileNotFound { name: String, path: PathBuf },

    /// `add` was asked to create a profile that is already saved.
    #[error("profile '{name}' already exists")]
    ProfileExists { name: String },

    /// Profile names become file names, so separators and leading dots are refused.
    #[error("invalid profile name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },
}
