//! File-tree operations engine for fantree.
//!
//! This crate provides async recursive delete, atomic-rename delete
//! (`deltree`), `mkdir -p` and recursive copy, all built on one tracked
//! facade over primitive file-system calls ([`FileOps`]).
//!
//! Every tree operation resolves only after all the work it fanned out has
//! finished: sibling entries of a directory run concurrently and are joined
//! through a pre-armed [`fantree_core::Counter`] before the parent proceeds.
//!
//! # Example
//!
//! ```rust,no_run
//! use fantree_ops::{copy_recursive, delete_folder_recursive, FileOps};
//!
//! # async fn demo() -> fantree_ops::Result<()> {
//! let ops = FileOps::default();
//! let copied = copy_recursive(&ops, "/data/in", "/data/backup").await?;
//! println!("{}", copied.summary());
//!
//! delete_folder_recursive(&ops, "/data/in").await?;
//! # Ok(())
//! # }
//! ```

mod copy;
mod delete;
mod deltree;
mod executor;
mod facade;
mod fanin;
mod mkdir;
mod operation;
mod paths;

pub use copy::{copy_file, copy_folder, copy_recursive};
pub use delete::delete_folder_recursive;
pub use deltree::{BackgroundDelete, Deltree, deltree};
pub use executor::{OperationEvent, OperationExecutor};
pub use facade::{EntryStat, FileOps, Listing};
pub use mkdir::make_dirs;
pub use operation::{OperationComplete, OperationType, TreeOperation};
pub use paths::{normalize, with_suffix};

// Re-export core types for convenience
pub use fantree_core::{EngineConfig, ErrorKind, FsError, OperationTracker, Result, TreeReport};

/// Default channel buffer size for operation events.
pub const OPERATION_CHANNEL_SIZE: usize = 100;
