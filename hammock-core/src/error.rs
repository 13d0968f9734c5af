//! Error types for hammock-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading the design tree from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    /// A file or directory could not be opened, listed, or fully read.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LoadError {
    /// Path that triggered the failure.
    pub fn path(&self) -> &std::path::Path {
        match self {
            LoadError::Io { path, .. } => path,
        }
    }
}

/// Convenience constructor for [`LoadError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> LoadError {
    LoadError::Io {
        path: path.into(),
        source,
    }
}

/// Errors raised by the configuration file layer.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure (permission denied, read-only filesystem, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error (save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load, with the offending file.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    /// No config file at the expected location.
    #[error("config not found at {path}; run `hammock init` first")]
    NotFound { path: PathBuf },
}
