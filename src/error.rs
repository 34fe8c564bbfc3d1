use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a whole index build.
#[derive(Error, Debug)]
pub enum DepsError {
    #[error("project root {path:?} is not a readable directory: {source}")]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("index build was cancelled")]
    Cancelled,

    #[error("failed to start worker pool: {0}")]
    WorkerPool(String),
}

/// A subdirectory (or symlink target) that could not be traversed.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct WalkError {
    pub message: String,
}

impl From<ignore::Error> for WalkError {
    fn from(err: ignore::Error) -> Self {
        Self {
            message: err.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("tree-sitter produced no syntax tree")]
    NoTree,
}

#[derive(Error, Debug)]
pub enum ImportMapError {
    #[error("failed to read import map {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse import map {path:?}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ImportMapError {
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Read { path, .. } | Self::Malformed { path, .. } => path,
        }
    }
}

/// A non-fatal problem recorded during a build. The build still succeeds and
/// the affected scope (subtree, file, or import map) simply contributes nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    DirectoryUnreadable { message: String },
    FileUnreadable { path: PathBuf, message: String },
    ParseFailed { path: PathBuf, message: String },
    ImportMapUnavailable { path: PathBuf, message: String },
}

impl Diagnostic {
    /// True for diagnostics that caused a single file to be skipped.
    pub fn is_file_skip(&self) -> bool {
        matches!(self, Self::FileUnreadable { .. } | Self::ParseFailed { .. })
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DirectoryUnreadable { message } => write!(f, "skipped directory: {message}"),
            Self::FileUnreadable { path, message } => {
                write!(f, "skipped {}: {message}", path.display())
            }
            Self::ParseFailed { path, message } => {
                write!(f, "could not parse {}: {message}", path.display())
            }
            Self::ImportMapUnavailable { path, message } => {
                write!(f, "ignoring import map {}: {message}", path.display())
            }
        }
    }
}

impl From<WalkError> for Diagnostic {
    fn from(err: WalkError) -> Self {
        Self::DirectoryUnreadable {
            message: err.message,
        }
    }
}

impl From<&ImportMapError> for Diagnostic {
    fn from(err: &ImportMapError) -> Self {
        Self::ImportMapUnavailable {
            path: err.path().clone(),
            message: err.to_string(),
        }
    }
}
