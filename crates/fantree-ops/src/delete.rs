//! Recursive directory deletion.

use std::path::{Path, PathBuf};

use tracing::Instrument;

use fantree_core::{Result, TreeReport};

use crate::facade::{FileOps, Listing};
use crate::fanin::{BoxFuture, fan_out};

/// Delete `dir` and everything below it.
///
/// A missing `dir` is a successful no-op. Entries of one directory are
/// removed concurrently; a directory is only removed after all of its
/// children are gone. Symlinks are unlinked, never followed, including
/// when `dir` itself is one.
pub async fn delete_folder_recursive(ops: &FileOps, dir: impl AsRef<Path>) -> Result<TreeReport> {
    let dir = dir.as_ref().to_path_buf();
    let report = delete_tree(ops.clone(), dir.clone()).await?;
    tracing::info!(path = %dir.display(), removed = %report.summary(), "delete complete");
    Ok(report)
}

pub(crate) fn delete_tree(ops: FileOps, dir: PathBuf) -> BoxFuture<TreeReport> {
    Box::pin(async move {
        if !ops.lexists(&dir).await {
            tracing::debug!(path = %dir.display(), "nothing to delete");
            return Ok(TreeReport::default());
        }
        delete_entry(ops, dir).await
    })
}

/// Remove one entry: unlink files and links, empty then remove directories.
async fn delete_entry(ops: FileOps, path: PathBuf) -> Result<TreeReport> {
    let stat = ops.lstat(&path).await?;
    if stat.is_dir {
        delete_dir(ops, path).await
    } else {
        ops.unlink(&path).await?;
        Ok(TreeReport::file(stat.len))
    }
}

fn delete_dir(ops: FileOps, dir: PathBuf) -> BoxFuture<TreeReport> {
    let span = tracing::debug_span!("delete", path = %dir.display());
    Box::pin(
        async move {
            let names = match ops.list_dir(&dir).await? {
                Listing::Empty => {
                    ops.rmdir(&dir).await?;
                    return Ok(TreeReport::directory());
                }
                Listing::Entries(names) => names,
            };

            let children: Vec<PathBuf> = names.into_iter().map(|name| dir.join(name)).collect();
            let task_ops = ops.clone();
            let removed = fan_out(format!("rmdir {}", dir.display()), children, move |child| {
                delete_entry(task_ops.clone(), child)
            })
            .await?;

            ops.rmdir(&dir).await?;
            Ok(removed.into_iter().sum::<TreeReport>() + TreeReport::directory())
        }
        .instrument(span),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_root_is_noop() {
        let tmp = TempDir::new().unwrap();
        let ops = FileOps::default();

        let report = delete_folder_recursive(&ops, tmp.path().join("nope"))
            .await
            .unwrap();
        assert!(report.is_empty());
    }

    #[tokio::test]
    async fn test_empty_directory() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("empty");
        fs::create_dir(&dir).unwrap();

        let report = delete_folder_recursive(&FileOps::default(), &dir).await.unwrap();
        assert!(!dir.exists());
        assert_eq!(report, TreeReport::directory());
    }

    #[tokio::test]
    async fn test_counts_files_and_bytes() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("root");
        fs::create_dir_all(dir.join("sub")).unwrap();
        fs::write(dir.join("a.txt"), b"hello").unwrap();
        fs::write(dir.join("sub/b.txt"), b"abc").unwrap();

        let report = delete_folder_recursive(&FileOps::default(), &dir).await.unwrap();
        assert!(!dir.exists());
        assert_eq!(report.files, 2);
        assert_eq!(report.directories, 2);
        assert_eq!(report.bytes, 8);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinked_directory_is_not_followed() {
        let tmp = TempDir::new().unwrap();
        let outside = tmp.path().join("outside");
        fs::create_dir(&outside).unwrap();
        fs::write(outside.join("keep.txt"), b"keep").unwrap();

        let dir = tmp.path().join("root");
        fs::create_dir(&dir).unwrap();
        std::os::unix::fs::symlink(&outside, dir.join("link")).unwrap();

        delete_folder_recursive(&FileOps::default(), &dir).await.unwrap();
        assert!(!dir.exists());
        assert!(outside.join("keep.txt").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_root_is_unlinked() {
        let tmp = TempDir::new().unwrap();
        let outside = tmp.path().join("outside");
        fs::create_dir(&outside).unwrap();
        fs::write(outside.join("keep.txt"), b"keep").unwrap();
        let link = tmp.path().join("link");
        std::os::unix::fs::symlink(&outside, &link).unwrap();

        let report = delete_folder_recursive(&FileOps::default(), &link).await.unwrap();

        assert!(fs::symlink_metadata(&link).is_err());
        assert!(outside.join("keep.txt").exists());
        assert_eq!(report.files, 1);
        assert_eq!(report.directories, 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_dangling_symlink_root_is_removed() {
        let tmp = TempDir::new().unwrap();
        let link = tmp.path().join("dangling");
        std::os::unix::fs::symlink(tmp.path().join("nowhere"), &link).unwrap();

        let report = delete_folder_recursive(&FileOps::default(), &link).await.unwrap();

        assert!(fs::symlink_metadata(&link).is_err());
        assert_eq!(report.files, 1);
    }

    #[tokio::test]
    async fn test_file_root_is_unlinked() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("plain.txt");
        fs::write(&file, b"12345").unwrap();

        let report = delete_folder_recursive(&FileOps::default(), &file).await.unwrap();
        assert!(!file.exists());
        assert_eq!(report, TreeReport::file(5));
    }
}
