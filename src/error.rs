//! Error type shared by the discovery engine.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub(crate) enum DiscoveryError {
    #[error("base directory not configured")]
    BaseDirNotConfigured,

    #[error("failed to expand path `{path}`: {message}")]
    ExpandPath { path: String, message: String },

    #[error("base directory path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("path no longer exists: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("not a main repository (has .git file, not directory): {0}")]
    NotMainRepository(PathBuf),

    #[error("git failed in {path}: {message}")]
    Git { path: PathBuf, message: String },

    #[error("no extractor could read worktree metadata in {0}")]
    Unsupported(PathBuf),

    #[error("invalid worktrees directory `{value}`: {reason}")]
    InvalidWorktreesDir { value: String, reason: &'static str },

    #[error("repository index: {0}")]
    Index(String),

    #[error("path is required for loading")]
    PathRequired,

    #[error("discovery pipeline closed before the walk finished")]
    PipelineClosed,
}

impl DiscoveryError {
    /// Wrap an I/O error, folding `NotFound` into [`DiscoveryError::NotFound`].
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            return Self::NotFound(path);
        }
        Self::Io { path, source }
    }

    /// True when the failure means "the path vanished", which is never worth reporting.
    pub(crate) fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Io { source, .. } => source.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

pub(crate) type Result<T> = std::result::Result<T, DiscoveryError>;

/// Log a per-item failure unless it is the expected "already gone" race.
pub(crate) fn warn_unless_not_found(context: &str, path: &std::path::Path, err: &DiscoveryError) {
    if !err.is_not_found() {
        log::warn!("{context} {}: {err}", path.display());
    }
}
