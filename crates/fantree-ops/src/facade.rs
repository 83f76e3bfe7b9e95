//! Tracked async wrappers over primitive file-system calls.
//!
//! Every primitive registers with the facade's [`OperationTracker`] before
//! it is dispatched and deregisters once its result has been classified,
//! whether it succeeded or not.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use fantree_core::{EngineConfig, FsError, FsOp, OperationGuard, OperationTracker, Result};

/// Contents of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    /// The directory has no entries.
    Empty,
    /// Entry names, in no particular order.
    Entries(Vec<OsString>),
}

/// The subset of metadata the tree algorithms branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryStat {
    pub is_dir: bool,
    pub is_symlink: bool,
    pub len: u64,
}

impl From<std::fs::Metadata> for EntryStat {
    fn from(metadata: std::fs::Metadata) -> Self {
        Self {
            is_dir: metadata.is_dir(),
            is_symlink: metadata.file_type().is_symlink(),
            len: metadata.len(),
        }
    }
}

/// How a failed primitive is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Policy {
    /// Log as an error and hand it back for propagation.
    Fatal,
    /// The caller classifies the error itself.
    Caller,
}

/// Log a failure the caller decided not to tolerate.
pub(crate) fn fatal(err: FsError) -> FsError {
    tracing::error!(error = %err, kind = %err.kind(), "file operation failed");
    err
}

/// Facade over the file system bound to one operation tracker.
///
/// Clones share the tracker and the concurrency limit.
#[derive(Debug, Clone)]
pub struct FileOps {
    tracker: OperationTracker,
    config: Arc<EngineConfig>,
    limiter: Option<Arc<Semaphore>>,
}

/// Held for the lifetime of one dispatched primitive.
struct InFlight {
    _permit: Option<OwnedSemaphorePermit>,
    _op: OperationGuard,
}

impl FileOps {
    /// Create a facade with a fresh tracker named after `config.name`.
    pub fn new(config: EngineConfig) -> Self {
        let tracker = OperationTracker::new(config.name.clone());
        Self::with_tracker(tracker, config)
    }

    /// Create a facade reporting to an existing tracker.
    pub fn with_tracker(tracker: OperationTracker, config: EngineConfig) -> Self {
        let limiter = match config.max_concurrent_ops {
            0 => None,
            n => Some(Arc::new(Semaphore::new(n))),
        };
        Self {
            tracker,
            config: Arc::new(config),
            limiter,
        }
    }

    pub fn tracker(&self) -> &OperationTracker {
        &self.tracker
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    async fn dispatch(&self, op: FsOp, path: &Path) -> InFlight {
        let guard = self.tracker.start();
        let permit = match &self.limiter {
            // The semaphore is never closed.
            Some(limiter) => Arc::clone(limiter).acquire_owned().await.ok(),
            None => None,
        };
        tracing::debug!(
            %op,
            path = %path.display(),
            tracker = self.tracker.name(),
            "dispatch"
        );
        InFlight {
            _permit: permit,
            _op: guard,
        }
    }

    fn settle<T>(op: FsOp, path: &Path, result: io::Result<T>, policy: Policy) -> Result<T> {
        result.map_err(|source| {
            let err = FsError::io(op, path, source);
            match policy {
                Policy::Fatal => fatal(err),
                Policy::Caller => {
                    tracing::debug!(
                        %op,
                        path = %path.display(),
                        kind = %err.kind(),
                        "returned to caller"
                    );
                    err
                }
            }
        })
    }

    /// Whether `path` exists. A failed probe counts as absent.
    pub async fn exists(&self, path: &Path) -> bool {
        let _op = self.dispatch(FsOp::Exists, path).await;
        fs::try_exists(path).await.unwrap_or(false)
    }

    /// Whether an entry exists at `path` itself, without following a final
    /// symlink. A dangling link counts as present.
    pub async fn lexists(&self, path: &Path) -> bool {
        let _op = self.dispatch(FsOp::Exists, path).await;
        fs::symlink_metadata(path).await.is_ok()
    }

    /// List the entry names of a directory.
    pub async fn list_dir(&self, path: &Path) -> Result<Listing> {
        let _op = self.dispatch(FsOp::ListDir, path).await;
        let result = async {
            let mut names = Vec::new();
            let mut entries = fs::read_dir(path).await?;
            while let Some(entry) = entries.next_entry().await? {
                names.push(entry.file_name());
            }
            Ok::<_, io::Error>(names)
        }
        .await;

        let names = Self::settle(FsOp::ListDir, path, result, Policy::Fatal)?;
        if names.is_empty() {
            Ok(Listing::Empty)
        } else {
            Ok(Listing::Entries(names))
        }
    }

    /// Create one directory level.
    pub async fn mkdir(&self, path: &Path) -> Result<()> {
        self.mkdir_with(path, Policy::Fatal).await
    }

    /// Create one directory level, leaving classification to the caller.
    pub async fn try_mkdir(&self, path: &Path) -> Result<()> {
        self.mkdir_with(path, Policy::Caller).await
    }

    async fn mkdir_with(&self, path: &Path, policy: Policy) -> Result<()> {
        let _op = self.dispatch(FsOp::MakeDir, path).await;
        let result = fs::create_dir(path).await;
        Self::settle(FsOp::MakeDir, path, result, policy)
    }

    /// Remove an empty directory.
    pub async fn rmdir(&self, path: &Path) -> Result<()> {
        let _op = self.dispatch(FsOp::RemoveDir, path).await;
        let result = fs::remove_dir(path).await;
        Self::settle(FsOp::RemoveDir, path, result, Policy::Fatal)
    }

    /// Remove a file or symlink.
    pub async fn unlink(&self, path: &Path) -> Result<()> {
        let _op = self.dispatch(FsOp::RemoveFile, path).await;
        let result = fs::remove_file(path).await;
        Self::settle(FsOp::RemoveFile, path, result, Policy::Fatal)
    }

    /// Atomically rename `from` to `to`.
    pub async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        self.rename_with(from, to, Policy::Fatal).await
    }

    /// Rename, leaving classification to the caller.
    pub async fn try_rename(&self, from: &Path, to: &Path) -> Result<()> {
        self.rename_with(from, to, Policy::Caller).await
    }

    async fn rename_with(&self, from: &Path, to: &Path, policy: Policy) -> Result<()> {
        let _op = self.dispatch(FsOp::Rename, from).await;
        let result = fs::rename(from, to).await;
        Self::settle(FsOp::Rename, from, result, policy)
    }

    /// Read a whole file.
    pub async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let _op = self.dispatch(FsOp::Read, path).await;
        let result = fs::read(path).await;
        Self::settle(FsOp::Read, path, result, Policy::Fatal)
    }

    /// Create or truncate a file with `contents`.
    pub async fn write(&self, path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
        let _op = self.dispatch(FsOp::Write, path).await;
        let result = fs::write(path, contents).await;
        Self::settle(FsOp::Write, path, result, Policy::Fatal)
    }

    /// Metadata, following symlinks.
    pub async fn stat(&self, path: &Path) -> Result<EntryStat> {
        let _op = self.dispatch(FsOp::Stat, path).await;
        let result = fs::metadata(path).await;
        Self::settle(FsOp::Stat, path, result, Policy::Fatal).map(EntryStat::from)
    }

    /// Canonical absolute path, leaving classification to the caller.
    pub async fn try_canonicalize(&self, path: &Path) -> Result<PathBuf> {
        let _op = self.dispatch(FsOp::Resolve, path).await;
        let result = fs::canonicalize(path).await;
        Self::settle(FsOp::Resolve, path, result, Policy::Caller)
    }

    /// Metadata of the entry itself; a symlink is never reported as a directory.
    pub async fn lstat(&self, path: &Path) -> Result<EntryStat> {
        let _op = self.dispatch(FsOp::Stat, path).await;
        let result = fs::symlink_metadata(path).await;
        Self::settle(FsOp::Stat, path, result, Policy::Fatal).map(EntryStat::from)
    }
}

impl Default for FileOps {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fantree_core::ErrorKind;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_tracker_drains_after_each_primitive() {
        let tmp = TempDir::new().unwrap();
        let ops = FileOps::default();

        assert!(ops.exists(tmp.path()).await);
        ops.mkdir(&tmp.path().join("a")).await.unwrap();
        assert_eq!(ops.tracker().in_flight(), 0);
        assert_eq!(ops.tracker().drain_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_primitive_still_finishes() {
        let tmp = TempDir::new().unwrap();
        let ops = FileOps::default();

        let err = ops.unlink(&tmp.path().join("missing")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(ops.tracker().in_flight(), 0);
        assert_eq!(ops.tracker().drain_count(), 1);
    }

    #[tokio::test]
    async fn test_list_dir_distinguishes_empty() {
        let tmp = TempDir::new().unwrap();
        let ops = FileOps::default();

        assert_eq!(ops.list_dir(tmp.path()).await.unwrap(), Listing::Empty);

        std::fs::write(tmp.path().join("one"), b"1").unwrap();
        match ops.list_dir(tmp.path()).await.unwrap() {
            Listing::Entries(names) => assert_eq!(names, vec![OsString::from("one")]),
            Listing::Empty => panic!("expected entries"),
        }
    }

    #[tokio::test]
    async fn test_try_mkdir_reports_kind() {
        let tmp = TempDir::new().unwrap();
        let ops = FileOps::default();

        let err = ops.try_mkdir(tmp.path()).await.unwrap_err();
        assert!(err.is_already_exists());

        let err = ops.try_mkdir(&tmp.path().join("x/y")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_read_write_stat() {
        let tmp = TempDir::new().unwrap();
        let ops = FileOps::default();
        let file = tmp.path().join("data.bin");

        ops.write(&file, [0u8, 1, 2, 255]).await.unwrap();
        assert_eq!(ops.read(&file).await.unwrap(), vec![0u8, 1, 2, 255]);

        let stat = ops.stat(&file).await.unwrap();
        assert!(!stat.is_dir);
        assert_eq!(stat.len, 4);
        assert!(ops.stat(tmp.path()).await.unwrap().is_dir);
    }

    #[tokio::test]
    async fn test_concurrency_limit_still_completes() {
        let tmp = TempDir::new().unwrap();
        let config = EngineConfig::builder()
            .max_concurrent_ops(1usize)
            .build()
            .unwrap();
        let ops = FileOps::new(config);

        let writes = (0..8).map(|i| {
            let ops = ops.clone();
            let path = tmp.path().join(format!("f{i}"));
            tokio::spawn(async move { ops.write(&path, b"x").await })
        });
        for handle in writes.collect::<Vec<_>>() {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(ops.tracker().in_flight(), 0);
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 8);
    }
}
