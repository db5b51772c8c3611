//! File system utilities for bundling.
//!
//! Async wrappers that create parent directories as needed and attach the
//! failing path to every error.

use crate::bundler::{
    error::{Error, ErrorExt, Result},
    params::RelativeFileSet,
};
use std::{io, path::Path};
use tokio::{fs, io::AsyncWriteExt};

/// Creates all of the directories of the specified path, erasing it first if specified.
pub async fn create_dir_all(path: &Path, erase: bool) -> Result<()> {
    if erase {
        remove_dir_all(path).await?;
    }
    fs::create_dir_all(path)
        .await
        .fs_context("creating directory", path)
}

/// Removes the directory and its contents if it exists.
pub async fn remove_dir_all(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).fs_context("removing directory", path),
    }
}

/// Writes `contents` to `path`, creating parent directories.
pub async fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .fs_context("creating directory", parent)?;
    }
    fs::write(path, contents).await.fs_context("writing", path)
}

/// Writes a text file prefixed with a UTF-8 byte order mark.
///
/// Inno Setup only reads scripts as UTF-8 when the BOM is present.
pub async fn write_utf8_bom(path: &Path, content: &str) -> Result<()> {
    let mut file = fs::File::create(path)
        .await
        .fs_context("creating script file", path)?;
    file.write_all(&[0xEF, 0xBB, 0xBF])
        .await
        .fs_context("writing UTF-8 BOM", path)?;
    file.write_all(content.as_bytes())
        .await
        .fs_context("writing script content", path)?;
    file.flush().await.fs_context("flushing script file", path)
}

/// Marks a file executable (`0755`). No-op where permissions do not apply.
pub async fn set_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
            .await
            .fs_context("setting permissions on", path)?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// Makes a symbolic link to a directory.
#[cfg(unix)]
fn symlink_dir(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

/// Makes a symbolic link to a directory.
#[cfg(windows)]
fn symlink_dir(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(src, dst)
}

/// Makes a symbolic link to a file.
#[cfg(unix)]
fn symlink_file(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

/// Makes a symbolic link to a file.
#[cfg(windows)]
fn symlink_file(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(src, dst)
}

/// Copies a regular file from one path to another, creating any parent
/// directories of the destination path as necessary.
///
/// Fails if the source path is a directory or doesn't exist.
pub async fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if !from.is_file() {
        return Err(Error::GenericError(format!(
            "{} does not exist or is not a file",
            from.display()
        )));
    }
    if let Some(dest_dir) = to.parent() {
        fs::create_dir_all(dest_dir)
            .await
            .fs_context("creating directory", dest_dir)?;
    }
    fs::copy(from, to).await.fs_context("copying", from)?;
    Ok(())
}

/// Recursively copies a directory from one path to another, creating any
/// parent directories of the destination path as necessary.
///
/// Symlinks are recreated, not followed.
pub async fn copy_dir(from: &Path, to: &Path) -> Result<()> {
    if !from.is_dir() {
        return Err(Error::GenericError(format!(
            "{} does not exist or is not a directory",
            from.display()
        )));
    }

    let from = from.to_path_buf();
    let to = to.to_path_buf();

    tokio::task::spawn_blocking(move || -> Result<()> {
        if let Some(parent) = to.parent() {
            std::fs::create_dir_all(parent).fs_context("creating directory", parent)?;
        }

        for entry in walkdir::WalkDir::new(&from) {
            let entry = entry?;
            let rel_path = entry.path().strip_prefix(&from)?;
            let dest_path = to.join(rel_path);

            if entry.file_type().is_symlink() {
                let target = std::fs::read_link(entry.path())
                    .fs_context("reading symlink", entry.path())?;
                let linked = if entry.path().is_dir() {
                    symlink_dir(&target, &dest_path)
                } else {
                    symlink_file(&target, &dest_path)
                };
                linked.fs_context("creating symlink", &dest_path)?;
            } else if entry.file_type().is_dir() {
                std::fs::create_dir_all(&dest_path).fs_context("creating directory", &dest_path)?;
            } else {
                std::fs::copy(entry.path(), &dest_path).fs_context("copying", entry.path())?;
            }
        }

        Ok(())
    })
    .await
    .map_err(|e| Error::GenericError(format!("Directory copy task panicked: {e}")))?
}

/// Copies every member of a file set below `dest`, keeping relative paths.
pub async fn copy_file_set(set: &RelativeFileSet, dest: &Path) -> Result<()> {
    for file in set.included_files() {
        let from = set.resolve(file);
        let to = dest.join(file);
        if from.is_dir() {
            copy_dir(&from, &to).await?;
        } else {
            copy_file(&from, &to).await?;
        }
    }
    Ok(())
}

/// Whether `dir` exists and holds at least one entry.
pub fn is_non_empty_dir(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn copy_file_set_keeps_layout() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(src.path().join("lib")).unwrap();
        std::fs::write(src.path().join("app.jar"), b"main").unwrap();
        std::fs::write(src.path().join("lib/dep.jar"), b"dep").unwrap();

        let set = RelativeFileSet::from_dir(src.path()).unwrap();
        copy_file_set(&set, &dst.path().join("app")).await.unwrap();

        assert_eq!(std::fs::read(dst.path().join("app/lib/dep.jar")).unwrap(), b"dep");
        assert!(dst.path().join("app/app.jar").is_file());
    }

    #[tokio::test]
    async fn create_dir_all_erases_when_asked() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out");
        write_file(&target.join("stale.txt"), "old").await.unwrap();

        create_dir_all(&target, true).await.unwrap();
        assert!(target.is_dir());
        assert!(!is_non_empty_dir(&target));
    }

    #[tokio::test]
    async fn bom_is_written_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("setup.iss");
        write_utf8_bom(&path, "[Setup]").await.unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);
        assert_eq!(&bytes[3..], b"[Setup]");
    }
}
