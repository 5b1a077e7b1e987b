use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("git error while {operation}: {source}")]
    Git {
        operation: &'static str,
        #[source]
        source: git2::Error,
    },

    #[error("I/O error while {operation} at {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not a git repository (run with --init to create one)")]
    NotARepository { path: PathBuf },

    #[error("{path} is a bare repository; a working tree is required")]
    BareRepository { path: PathBuf },

    #[error("invalid project path '{path}': {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error("nothing to undo: the repository has fewer than two commits")]
    NothingToUndo,

    #[error("unknown commit '{commit}'")]
    UnknownCommit {
        commit: String,
        #[source]
        source: git2::Error,
    },
}

impl RepoError {
    #[must_use]
    pub fn git(operation: &'static str, source: git2::Error) -> Self {
        Self::Git { operation, source }
    }

    #[must_use]
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    #[must_use]
    pub fn invalid_path(path: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason,
        }
    }
}
