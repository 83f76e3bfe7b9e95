//! Recursive copy of files and directory trees.

use std::path::{Path, PathBuf};

use tracing::Instrument;

use fantree_core::{FsError, FsOp, Result, TreeReport};

use crate::facade::{FileOps, Listing, fatal};
use crate::fanin::{BoxFuture, fan_out};
use crate::mkdir::make_dirs;
use crate::paths::normalize;

/// Copy the bytes of one file, replacing `dest` if it exists.
///
/// There is no partial-write recovery: a failed write leaves `dest` as the
/// failed call left it.
pub async fn copy_file(
    ops: &FileOps,
    source: impl AsRef<Path>,
    dest: impl AsRef<Path>,
) -> Result<TreeReport> {
    let contents = ops.read(source.as_ref()).await?;
    let len = contents.len() as u64;
    ops.write(dest.as_ref(), contents).await?;
    Ok(TreeReport::file(len))
}

/// Copy the contents of directory `source` into `dest`, creating `dest`
/// (and its ancestors) when missing.
///
/// Resolves once every file below `source` has been written. A `dest`
/// inside `source` is rejected however it is spelled (relative, `..`,
/// through a symlink).
pub async fn copy_folder(
    ops: &FileOps,
    source: impl AsRef<Path>,
    dest: impl AsRef<Path>,
) -> Result<TreeReport> {
    let source = normalize(source.as_ref());
    let dest = normalize(dest.as_ref());

    if resolve(ops, &dest).await?.starts_with(resolve(ops, &source).await?) {
        return Err(fatal(FsError::NestedTarget {
            source_path: source,
            dest_path: dest,
        }));
    }

    let report = copy_dir(ops.clone(), source.clone(), dest.clone()).await?;
    tracing::info!(
        source = %source.display(),
        dest = %dest.display(),
        copied = %report.summary(),
        "copy complete"
    );
    Ok(report)
}

/// Copy `source` to `dest`, whether it is a file or a directory.
///
/// A missing `source` is a successful no-op.
pub async fn copy_recursive(
    ops: &FileOps,
    source: impl AsRef<Path>,
    dest: impl AsRef<Path>,
) -> Result<TreeReport> {
    let source = source.as_ref();
    if !ops.exists(source).await {
        tracing::debug!(source = %source.display(), "nothing to copy");
        return Ok(TreeReport::default());
    }

    if ops.stat(source).await?.is_dir {
        copy_folder(ops, source, dest).await
    } else {
        copy_file(ops, source, dest).await
    }
}

/// Absolute, symlink-free spelling of `path`. Trailing components that do
/// not exist yet are appended to the nearest existing ancestor.
async fn resolve(ops: &FileOps, path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path)
        .map(|p| normalize(&p))
        .map_err(|e| fatal(FsError::io(FsOp::Resolve, path, e)))?;

    let mut base = absolute.as_path();
    let mut missing = Vec::new();
    loop {
        match ops.try_canonicalize(base).await {
            Ok(real) => return Ok(missing.iter().rev().fold(real, |acc, name| acc.join(name))),
            Err(err) if err.is_not_found() => match (base.parent(), base.file_name()) {
                (Some(parent), Some(name)) => {
                    missing.push(name.to_os_string());
                    base = parent;
                }
                _ => return Ok(absolute.clone()),
            },
            Err(err) => return Err(fatal(err)),
        }
    }
}

fn copy_dir(ops: FileOps, source: PathBuf, dest: PathBuf) -> BoxFuture<TreeReport> {
    let span = tracing::debug_span!("copy", source = %source.display());
    Box::pin(
        async move {
            let mut report = TreeReport::default();
            if !ops.exists(&dest).await {
                make_dirs(&ops, &dest).await?;
                report += TreeReport::directory();
            }

            let names = match ops.list_dir(&source).await? {
                Listing::Empty => return Ok(report),
                Listing::Entries(names) => names,
            };

            let pairs: Vec<(PathBuf, PathBuf)> = names
                .into_iter()
                .map(|name| (source.join(&name), dest.join(&name)))
                .collect();
            let task_ops = ops.clone();
            let copied = fan_out(format!("copy {}", source.display()), pairs, move |(from, to)| {
                copy_entry(task_ops.clone(), from, to)
            })
            .await?;

            Ok(report + copied.into_iter().sum::<TreeReport>())
        }
        .instrument(span),
    )
}

async fn copy_entry(ops: FileOps, from: PathBuf, to: PathBuf) -> Result<TreeReport> {
    if ops.stat(&from).await?.is_dir {
        copy_dir(ops, from, to).await
    } else {
        copy_file(&ops, &from, &to).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_copy_file() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src.bin");
        let dst = tmp.path().join("dst.bin");
        fs::write(&src, [0u8, 159, 146, 150]).unwrap();

        let report = copy_file(&FileOps::default(), &src, &dst).await.unwrap();
        assert_eq!(fs::read(&dst).unwrap(), vec![0u8, 159, 146, 150]);
        assert_eq!(report, TreeReport::file(4));
    }

    #[tokio::test]
    async fn test_missing_source_file_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let err = copy_file(&FileOps::default(), tmp.path().join("nope"), tmp.path().join("out"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(!tmp.path().join("out").exists());
    }

    #[tokio::test]
    async fn test_copy_recursive_missing_source() {
        let tmp = TempDir::new().unwrap();
        let ops = FileOps::default();
        let report = copy_recursive(&ops, tmp.path().join("nope"), tmp.path().join("out"))
            .await
            .unwrap();
        assert!(report.is_empty());
        assert!(!tmp.path().join("out").exists());
    }

    #[tokio::test]
    async fn test_copy_into_existing_destination() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        fs::create_dir(&src).unwrap();
        fs::create_dir(&dst).unwrap();
        fs::write(src.join("a"), b"a").unwrap();

        let report = copy_folder(&FileOps::default(), &src, &dst).await.unwrap();
        assert_eq!(fs::read(dst.join("a")).unwrap(), b"a");
        assert_eq!(report.directories, 0);
        assert_eq!(report.files, 1);
    }

    #[tokio::test]
    async fn test_copy_into_itself_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir(&src).unwrap();

        let err = copy_folder(&FileOps::default(), &src, src.join("inner"))
            .await
            .unwrap_err();
        assert!(matches!(err, FsError::NestedTarget { .. }));
        assert!(!src.join("inner").exists());
    }

    #[tokio::test]
    async fn test_relative_destination_inside_source_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir(&src).unwrap();
        fs::write(src.join("a"), b"a").unwrap();

        let previous = std::env::current_dir().unwrap();
        std::env::set_current_dir(tmp.path()).unwrap();
        let result = copy_folder(&FileOps::default(), &src, "src/inner").await;
        std::env::set_current_dir(previous).unwrap();

        assert!(matches!(result, Err(FsError::NestedTarget { .. })));
        assert!(!src.join("inner").exists());
    }

    #[tokio::test]
    async fn test_dotdot_destination_inside_source_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir_all(src.join("sub")).unwrap();

        let err = copy_folder(&FileOps::default(), &src, src.join("sub/../inner"))
            .await
            .unwrap_err();
        assert!(matches!(err, FsError::NestedTarget { .. }));
        assert!(!src.join("inner").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_destination_through_symlink_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir(&src).unwrap();
        let alias = tmp.path().join("alias");
        std::os::unix::fs::symlink(&src, &alias).unwrap();

        let err = copy_folder(&FileOps::default(), &src, alias.join("inner"))
            .await
            .unwrap_err();
        assert!(matches!(err, FsError::NestedTarget { .. }));
        assert!(!src.join("inner").exists());
    }

    #[tokio::test]
    async fn test_sibling_with_shared_prefix_is_allowed() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir(&src).unwrap();
        fs::write(src.join("a"), b"a").unwrap();

        copy_folder(&FileOps::default(), &src, tmp.path().join("src2"))
            .await
            .unwrap();
        assert_eq!(fs::read(tmp.path().join("src2/a")).unwrap(), b"a");
    }
}
