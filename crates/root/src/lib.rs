#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Filesystem operations for arbor
//!
//! This crate provides the primitives the finalizer is built on: existence
//! probes with lstat semantics, recursive creation and idempotent recursive
//! deletion, directory listing, directory symlinks, and a move service that
//! renames when possible and falls back to a bounded-concurrency copy when
//! source and destination live on different volumes.

use futures::stream::{self, TryStreamExt};
use std::path::{Path, PathBuf};
use tokio::fs;

use arbor_errors::StorageError;

/// Result type for filesystem operations
type Result<T> = std::result::Result<T, arbor_errors::Error>;

/// Options for [`move_path`]
#[derive(Debug, Clone, Copy)]
pub struct MoveOptions {
    /// Maximum number of file copies in flight during a cross-device move
    pub concurrency: usize,
}

impl Default for MoveOptions {
    fn default() -> Self {
        Self { concurrency: 4 }
    }
}

/// Check if a path exists, without following a symlink at the path itself
///
/// A dangling symlink counts as existing; the finalizer must treat it as an
/// occupied destination.
pub async fn exists(path: &Path) -> bool {
    fs::symlink_metadata(path).await.is_ok()
}

/// Create a directory with all parent directories
///
/// # Errors
///
/// Returns an error if permission is denied or any I/O operation fails
/// during directory creation.
pub async fn create_dir_all(path: &Path) -> Result<()> {
    fs::create_dir_all(path).await.map_err(|e| {
        StorageError::DirectoryCreationFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        }
        .into()
    })
}

/// Remove whatever sits at a path, recursively and idempotently
///
/// Files and symlinks are unlinked, directories removed with their
/// contents. A missing path is success.
///
/// # Errors
///
/// Returns an error if a removal operation fails for a reason other than
/// the path not existing.
pub async fn remove_dir_all(path: &Path) -> Result<()> {
    let metadata = match fs::symlink_metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            return Err(StorageError::DirectoryRemovalFailed {
                path: path.display().to_string(),
                message: e.to_string(),
            }
            .into())
        }
    };

    let result = if metadata.is_dir() {
        fs::remove_dir_all(path).await
    } else {
        fs::remove_file(path).await
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StorageError::DirectoryRemovalFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        }
        .into()),
    }
}

/// List the entry names of a directory, sorted
///
/// # Errors
///
/// Returns `StorageError::PathNotFound` if the directory does not exist;
/// callers that treat a missing directory as empty flatten this
/// deliberately.
pub async fn list_dir(path: &Path) -> Result<Vec<String>> {
    let mut entries = fs::read_dir(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            StorageError::PathNotFound {
                path: path.display().to_string(),
            }
        } else {
            StorageError::DirectoryListingFailed {
                path: path.display().to_string(),
                message: e.to_string(),
            }
        }
    })?;

    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| {
        StorageError::DirectoryListingFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        }
    })? {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort_unstable();
    Ok(names)
}

/// Create a directory-type symbolic link at `link` pointing to `target`
///
/// On Windows this is a directory symlink (the junction-style link kind);
/// on Unix there is only one kind of symlink.
///
/// # Errors
///
/// Returns an error if link creation fails (permissions, existing entry at
/// `link`, etc.).
pub async fn symlink_dir(target: &Path, link: &Path) -> Result<()> {
    #[cfg(unix)]
    let result = fs::symlink(target, link).await;

    #[cfg(windows)]
    let result = fs::symlink_dir(target, link).await;

    result.map_err(|e| {
        StorageError::SymlinkCreationFailed {
            message: format!("{} -> {}: {e}", link.display(), target.display()),
        }
        .into()
    })
}

/// Move a file or directory tree from `src` to `dst`
///
/// Performs an atomic rename when source and destination are on the same
/// volume. Across volumes, falls back to copying the tree (file copies
/// bounded by `options.concurrency`) and then deleting the source.
///
/// # Errors
///
/// Returns an error if the rename fails for a reason other than crossing
/// volumes, or if any step of the copy-then-delete fallback fails.
pub async fn move_path(src: &Path, dst: &Path, options: &MoveOptions) -> Result<()> {
    match fs::rename(src, dst).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices => {
            copy_any(src, dst, options.concurrency)
                .await
                .map_err(|copy_err| {
                    StorageError::CrossDeviceMoveFailed {
                        from: src.display().to_string(),
                        to: dst.display().to_string(),
                        message: copy_err.to_string(),
                    }
                })?;
            remove_dir_all(src).await
        }
        Err(e) => Err(StorageError::AtomicRenameFailed {
            message: format!("{} -> {}: {e}", src.display(), dst.display()),
        }
        .into()),
    }
}

/// Copy a single entry of any kind to `dst`
async fn copy_any(src: &Path, dst: &Path, concurrency: usize) -> std::io::Result<()> {
    let metadata = fs::symlink_metadata(src).await?;
    if metadata.is_dir() {
        copy_tree(src, dst, concurrency).await
    } else if metadata.is_symlink() {
        copy_symlink(src, dst).await
    } else {
        fs::copy(src, dst).await.map(|_| ())
    }
}

/// Recursively copy a directory tree with bounded file-copy parallelism
///
/// Directories are created during the walk; file copies are batched behind
/// the concurrency cap afterwards so a wide tree cannot exhaust file
/// descriptors.
async fn copy_tree(src: &Path, dst: &Path, concurrency: usize) -> std::io::Result<()> {
    let mut files = Vec::new();
    let mut links = Vec::new();
    collect_tree(src, dst, &mut files, &mut links).await?;

    stream::iter(files.into_iter().map(Ok::<_, std::io::Error>))
        .try_for_each_concurrent(concurrency.max(1), |(from, to)| async move {
            fs::copy(&from, &to).await.map(|_| ())
        })
        .await?;

    for (from, to) in links {
        copy_symlink(&from, &to).await?;
    }
    Ok(())
}

/// Walk `src`, creating directories under `dst` and recording files and
/// symlinks for later copying
async fn collect_tree(
    src: &Path,
    dst: &Path,
    files: &mut Vec<(PathBuf, PathBuf)>,
    links: &mut Vec<(PathBuf, PathBuf)>,
) -> std::io::Result<()> {
    fs::create_dir_all(dst).await?;

    let mut entries = fs::read_dir(src).await?;
    while let Some(entry) = entries.next_entry().await? {
        let file_type = entry.file_type().await?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if file_type.is_dir() {
            Box::pin(collect_tree(&src_path, &dst_path, files, links)).await?;
        } else if file_type.is_symlink() {
            links.push((src_path, dst_path));
        } else {
            files.push((src_path, dst_path));
        }
    }
    Ok(())
}

/// Recreate a symlink at `dst` with the same target as the one at `src`
async fn copy_symlink(src: &Path, dst: &Path) -> std::io::Result<()> {
    let target = fs::read_link(src).await?;

    #[cfg(unix)]
    {
        fs::symlink(&target, dst).await
    }

    #[cfg(windows)]
    {
        // Link kind must match what the target resolves to
        match fs::metadata(src).await {
            Ok(metadata) if metadata.is_dir() => fs::symlink_dir(&target, dst).await,
            _ => fs::symlink_file(&target, dst).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn remove_is_idempotent() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("victim");
        fs::create_dir_all(path.join("nested")).await.unwrap();
        fs::write(path.join("nested/file.txt"), b"x").await.unwrap();

        remove_dir_all(&path).await.unwrap();
        assert!(!exists(&path).await);

        // Second call is a no-op, not an error
        remove_dir_all(&path).await.unwrap();
    }

    #[tokio::test]
    async fn remove_handles_plain_files() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("file.txt");
        fs::write(&file, b"x").await.unwrap();

        remove_dir_all(&file).await.unwrap();
        assert!(!exists(&file).await);
    }

    #[tokio::test]
    async fn list_dir_missing_is_path_not_found() {
        let temp = tempdir().unwrap();
        let err = list_dir(&temp.path().join("absent")).await.unwrap_err();
        assert!(matches!(
            err,
            arbor_errors::Error::Storage(StorageError::PathNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn list_dir_returns_sorted_names() {
        let temp = tempdir().unwrap();
        for name in ["c", "a", "b"] {
            fs::create_dir(temp.path().join(name)).await.unwrap();
        }
        let names = list_dir(temp.path()).await.unwrap();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn move_path_renames_directories() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("src");
        let dst = temp.path().join("dst");
        fs::create_dir_all(src.join("sub")).await.unwrap();
        fs::write(src.join("sub/file.txt"), b"content").await.unwrap();

        move_path(&src, &dst, &MoveOptions::default()).await.unwrap();

        assert!(!exists(&src).await);
        let content = fs::read(dst.join("sub/file.txt")).await.unwrap();
        assert_eq!(content, b"content");
    }

    #[tokio::test]
    async fn move_path_missing_source_fails() {
        let temp = tempdir().unwrap();
        let err = move_path(
            &temp.path().join("absent"),
            &temp.path().join("dst"),
            &MoveOptions::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            arbor_errors::Error::Storage(StorageError::AtomicRenameFailed { .. })
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn dangling_symlink_counts_as_existing() {
        let temp = tempdir().unwrap();
        let link = temp.path().join("link");
        symlink_dir(&temp.path().join("no-such-target"), &link)
            .await
            .unwrap();
        assert!(exists(&link).await);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn copy_tree_preserves_symlinks() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(&src).await.unwrap();
        fs::write(src.join("real.txt"), b"x").await.unwrap();
        fs::symlink("real.txt", src.join("alias")).await.unwrap();

        let dst = temp.path().join("dst");
        copy_tree(&src, &dst, 4).await.unwrap();

        let target = fs::read_link(dst.join("alias")).await.unwrap();
        assert_eq!(target, Path::new("real.txt"));
    }
}
