//! Error and failure types for walking operations.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while examining a single filesystem entry.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found (includes dangling symlinks, since lookups follow links).
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ProbeError {
    /// Create a probe error with path context, classifying by error kind.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Path the error refers to.
    pub fn path(&self) -> &Path {
        match self {
            Self::PermissionDenied { path } | Self::NotFound { path } | Self::Io { path, .. } => {
                path
            }
        }
    }
}

/// Stage of the walk at which a failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Metadata retrieval failed.
    Probe,
    /// The directory was probed but its children could not be listed.
    List,
    /// Streaming file content through the digest failed.
    Hash,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Probe => write!(f, "probe"),
            Self::List => write!(f, "list"),
            Self::Hash => write!(f, "hash"),
        }
    }
}

/// A recorded per-entry failure.
#[derive(Debug, Serialize)]
pub struct WalkFailure {
    /// Absolute path of the entry that failed.
    pub absolute_path: PathBuf,
    /// Where in the walk the failure happened.
    pub kind: FailureKind,
    /// Underlying cause.
    #[serde(serialize_with = "serialize_error")]
    pub error: ProbeError,
}

impl WalkFailure {
    /// Create a new failure record.
    pub fn new(absolute_path: impl Into<PathBuf>, kind: FailureKind, error: ProbeError) -> Self {
        Self {
            absolute_path: absolute_path.into(),
            kind,
            error,
        }
    }
}

fn serialize_error<S>(error: &ProbeError, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_str(error)
}
