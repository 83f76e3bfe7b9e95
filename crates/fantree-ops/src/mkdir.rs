//! Recursive directory creation (`mkdir -p`).

use std::path::{Path, PathBuf};

use fantree_core::{FsError, Result};

use crate::facade::{FileOps, fatal};
use crate::fanin::BoxFuture;
use crate::paths::normalize;

/// Create `folder` and any missing ancestors.
///
/// Succeeds when `folder` already exists. Missing parents are discovered
/// one level at a time: a not-found from `mkdir` creates the parent and
/// retries once.
pub async fn make_dirs(ops: &FileOps, folder: impl AsRef<Path>) -> Result<()> {
    ensure_dir(ops.clone(), normalize(folder.as_ref())).await
}

fn ensure_dir(ops: FileOps, folder: PathBuf) -> BoxFuture<()> {
    Box::pin(async move {
        let err = match ops.try_mkdir(&folder).await {
            Ok(()) => return Ok(()),
            Err(err) if err.is_already_exists() => return Ok(()),
            Err(err) if err.is_not_found() => err,
            Err(err) => return Err(fatal(err)),
        };

        let Some(parent) = folder.parent().filter(|p| !p.as_os_str().is_empty()) else {
            tracing::debug!(error = %err, "no parent left to create");
            return Err(fatal(FsError::NoParent {
                path: folder.clone(),
            }));
        };

        tracing::debug!(
            path = %folder.display(),
            parent = %parent.display(),
            "creating missing parent"
        );
        ensure_dir(ops.clone(), parent.to_path_buf()).await?;

        match ops.try_mkdir(&folder).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_already_exists() => Ok(()),
            Err(err) => Err(fatal(err)),
        }
    })
}
