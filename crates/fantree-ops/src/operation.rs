//! Tree operation descriptions and completion types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use fantree_core::TreeReport;

/// A tree operation to be executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TreeOperation {
    /// Recursively delete a directory in place.
    Delete { path: PathBuf },
    /// Rename a directory away, then delete it.
    Deltree {
        path: PathBuf,
        /// Also wait for the background deletion before completing.
        wait: bool,
    },
    /// Create a directory and its missing ancestors.
    MakeDirs { path: PathBuf },
    /// Copy a file or directory tree.
    Copy { source: PathBuf, destination: PathBuf },
}

impl TreeOperation {
    pub fn delete(path: impl Into<PathBuf>) -> Self {
        Self::Delete { path: path.into() }
    }

    pub fn deltree(path: impl Into<PathBuf>, wait: bool) -> Self {
        Self::Deltree {
            path: path.into(),
            wait,
        }
    }

    pub fn make_dirs(path: impl Into<PathBuf>) -> Self {
        Self::MakeDirs { path: path.into() }
    }

    pub fn copy(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self::Copy {
            source: source.into(),
            destination: destination.into(),
        }
    }

    pub fn operation_type(&self) -> OperationType {
        match self {
            Self::Delete { .. } => OperationType::Delete,
            Self::Deltree { .. } => OperationType::Deltree,
            Self::MakeDirs { .. } => OperationType::MakeDirs,
            Self::Copy { .. } => OperationType::Copy,
        }
    }
}

/// The type of operation being performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationType {
    Delete,
    Deltree,
    MakeDirs,
    Copy,
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Delete => write!(f, "Delete"),
            Self::Deltree => write!(f, "Deltree"),
            Self::MakeDirs => write!(f, "Create directories"),
            Self::Copy => write!(f, "Copy"),
        }
    }
}

/// Result of a completed operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationComplete {
    /// The type of operation.
    pub operation_type: OperationType,
    /// What was removed, created or written.
    pub report: TreeReport,
    /// Error message if the operation failed.
    pub error: Option<String>,
    /// Whether a background deletion was left running.
    pub detached: bool,
}

impl OperationComplete {
    /// Check if the operation was fully successful.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Get a human-readable summary of the operation.
    pub fn summary(&self) -> String {
        if let Some(error) = &self.error {
            return format!("{} failed: {}", self.operation_type, error);
        }

        let action = match self.operation_type {
            OperationType::Delete | OperationType::Deltree => "Deleted",
            OperationType::MakeDirs => "Created",
            OperationType::Copy => "Copied",
        };
        let mut summary = format!(
            "{} {} files, {} directories",
            action, self.report.files, self.report.directories
        );
        if self.detached {
            summary.push_str(" (cleanup continues in background)");
        }
        summary
    }
}
