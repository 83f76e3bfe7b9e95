//! Atomic-rename deletion.
//!
//! The directory is first renamed to `<dir><suffix>` so it leaves the
//! namespace in one step; the slow recursive removal then runs in the
//! background on an independent facade. A leftover `<dir><suffix>` from an
//! interrupted run is cleaned up on the next call.

use std::fmt;
use std::path::{Path, PathBuf};

use tokio::task::JoinHandle;

use fantree_core::{FsError, OperationTracker, Result, TreeReport};

use crate::delete::{delete_folder_recursive, delete_tree};
use crate::facade::{FileOps, fatal};
use crate::paths::{normalize, with_suffix};

/// Outcome of [`deltree`].
#[derive(Debug)]
pub enum Deltree {
    /// There was nothing to delete.
    Missing,
    /// A stale temp directory was found; it and `dir` were deleted in place.
    Recovered(TreeReport),
    /// `dir` was renamed away and is being deleted in the background.
    Renamed(BackgroundDelete),
}

impl Deltree {
    /// Wait for any background cleanup and return what was removed.
    pub async fn finish(self) -> Result<TreeReport> {
        match self {
            Self::Missing => Ok(TreeReport::default()),
            Self::Recovered(report) => Ok(report),
            Self::Renamed(background) => background.wait().await,
        }
    }
}

/// Handle to the background deletion of a renamed directory.
///
/// Dropping the handle detaches the task; the deletion keeps running.
pub struct BackgroundDelete {
    temp_path: PathBuf,
    tracker: OperationTracker,
    handle: JoinHandle<Result<TreeReport>>,
}

impl BackgroundDelete {
    /// Where the directory now lives until it is gone.
    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Tracker of the independent facade doing the deletion.
    pub fn tracker(&self) -> &OperationTracker {
        &self.tracker
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the background deletion to complete.
    pub async fn wait(self) -> Result<TreeReport> {
        self.handle.await.map_err(|e| FsError::TaskFailed {
            message: format!("background delete of {}: {e}", self.temp_path.display()),
        })?
    }
}

impl fmt::Debug for BackgroundDelete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackgroundDelete")
            .field("temp_path", &self.temp_path)
            .field("tracker", &self.tracker)
            .field("finished", &self.is_finished())
            .finish()
    }
}

/// Make `dir` disappear atomically, then delete it in the background.
///
/// Must be called from within a tokio runtime.
pub async fn deltree(ops: &FileOps, dir: impl AsRef<Path>) -> Result<Deltree> {
    let dir = normalize(dir.as_ref());
    let temp = with_suffix(&dir, &ops.config().deltree_suffix);

    if ops.lexists(&temp).await {
        tracing::warn!(
            path = %dir.display(),
            stale = %temp.display(),
            "found leftover of an interrupted deltree"
        );
        let (stale, current) = tokio::join!(
            delete_folder_recursive(ops, &temp),
            delete_folder_recursive(ops, &dir)
        );
        return Ok(Deltree::Recovered(stale? + current?));
    }

    match ops.try_rename(&dir, &temp).await {
        Ok(()) => {}
        Err(err) if err.is_not_found() => {
            tracing::debug!(path = %dir.display(), "nothing to deltree");
            return Ok(Deltree::Missing);
        }
        Err(err) => return Err(fatal(err)),
    }

    let background = FileOps::new(
        ops.config()
            .named(format!("background delete {}", dir.display())),
    );
    let tracker = background.tracker().clone();
    let handle = tokio::spawn(delete_tree(background, temp.clone()));
    tracing::info!(
        path = %dir.display(),
        temp = %temp.display(),
        "renamed away, deleting in background"
    );

    Ok(Deltree::Renamed(BackgroundDelete {
        temp_path: temp,
        tracker,
        handle,
    }))
}
