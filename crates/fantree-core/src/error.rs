//! Error types for file-tree operations.

use std::fmt;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The error vocabulary tree algorithms branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The path (or one of its parents) does not exist.
    NotFound,
    /// The path already exists.
    AlreadyExists,
    /// Anything else: permissions, full disk, wrong file type, ...
    Other,
}

impl From<io::ErrorKind> for ErrorKind {
    fn from(kind: io::ErrorKind) -> Self {
        match kind {
            io::ErrorKind::NotFound => Self::NotFound,
            io::ErrorKind::AlreadyExists => Self::AlreadyExists,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::AlreadyExists => write!(f, "already exists"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Primitive file-system operation names, used for error context and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FsOp {
    Exists,
    ListDir,
    MakeDir,
    RemoveDir,
    RemoveFile,
    Rename,
    Read,
    Write,
    Stat,
    Resolve,
}

impl fmt::Display for FsOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Exists => "exists",
            Self::ListDir => "readdir",
            Self::MakeDir => "mkdir",
            Self::RemoveDir => "rmdir",
            Self::RemoveFile => "unlink",
            Self::Rename => "rename",
            Self::Read => "read",
            Self::Write => "write",
            Self::Stat => "stat",
            Self::Resolve => "realpath",
        };
        f.write_str(name)
    }
}

/// Errors surfaced by the engine.
#[derive(Debug, Error)]
pub enum FsError {
    /// A primitive I/O request failed.
    #[error("{op} failed at {path} ({kind}): {source}")]
    Io {
        op: FsOp,
        path: PathBuf,
        kind: ErrorKind,
        #[source]
        source: io::Error,
    },

    /// `mkdir -p` ran out of parents to create.
    #[error("Cannot create {path}: no parent directory to create")]
    NoParent { path: PathBuf },

    /// A copy destination lies inside its own source tree.
    #[error("Cannot copy {source_path} into itself ({dest_path})")]
    NestedTarget {
        source_path: PathBuf,
        dest_path: PathBuf,
    },

    /// A fanned-out child task ended without reporting a result.
    #[error("Task failed: {message}")]
    TaskFailed { message: String },
}

impl FsError {
    /// Wrap an I/O error with operation and path context.
    pub fn io(op: FsOp, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            kind: source.kind().into(),
            source,
        }
    }

    /// Classify into the engine's error vocabulary.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { kind, .. } => *kind,
            Self::NoParent { .. } | Self::NestedTarget { .. } | Self::TaskFailed { .. } => {
                ErrorKind::Other
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn is_already_exists(&self) -> bool {
        self.kind() == ErrorKind::AlreadyExists
    }

    /// The path involved, if any.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::Io { path, .. } | Self::NoParent { path } => Some(path),
            Self::NestedTarget { dest_path, .. } => Some(dest_path),
            Self::TaskFailed { .. } => None,
        }
    }
}

/// Result alias used across the workspace.
pub type Result<T, E = FsError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        let err = FsError::io(
            FsOp::Rename,
            "/test/path",
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.is_not_found());
        assert!(!err.is_already_exists());

        let err = FsError::io(
            FsOp::MakeDir,
            "/test/path",
            io::Error::new(io::ErrorKind::AlreadyExists, "exists"),
        );
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);

        let err = FsError::io(
            FsOp::RemoveFile,
            "/test/path",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.kind(), ErrorKind::Other);
    }

    #[test]
    fn test_display_includes_context() {
        let err = FsError::io(
            FsOp::Stat,
            "/test/file",
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        let msg = err.to_string();
        assert!(msg.contains("stat"));
        assert!(msg.contains("/test/file"));
        assert!(msg.contains("not found"));
        assert_eq!(err.path(), Some(std::path::Path::new("/test/file")));
    }

    #[test]
    fn test_non_io_errors_are_other() {
        let err = FsError::TaskFailed {
            message: "panicked".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Other);
        assert!(err.path().is_none());
    }
}
