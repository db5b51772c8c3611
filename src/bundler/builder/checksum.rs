//! Artifact size and checksum calculation.
//!
//! Installers are single files; application images are directory trees.
//! Both get a SHA-256 digest and a total size.

use crate::{
    bail,
    bundler::{Result, error::ErrorExt},
};
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::io::AsyncReadExt;

/// Size in bytes and hex SHA-256 of a file or directory tree.
///
/// Directory digests cover each file's relative path followed by its
/// content, in sorted path order, so identical trees hash identically.
pub async fn measure(path: &Path) -> Result<(u64, String)> {
    let metadata = tokio::fs::metadata(path)
        .await
        .fs_context("reading artifact metadata", path)?;

    let mut hasher = Sha256::new();
    let size = if metadata.is_file() {
        hash_file(&mut hasher, path).await?
    } else if metadata.is_dir() {
        let mut files: Vec<_> = walkdir::WalkDir::new(path)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .collect();
        files.sort();

        let mut total = 0;
        for file in files {
            let relative = file.strip_prefix(path)?;
            hasher.update(relative.to_string_lossy().as_bytes());
            total += hash_file(&mut hasher, &file).await?;
        }
        total
    } else {
        bail!("Path is neither file nor directory: {}", path.display())
    };

    Ok((size, format!("{:x}", hasher.finalize())))
}

async fn hash_file(hasher: &mut Sha256, path: &Path) -> Result<u64> {
    let mut file = tokio::fs::File::open(path)
        .await
        .fs_context("opening file for hashing", path)?;
    let mut buffer = vec![0u8; 8192];
    let mut total = 0u64;

    loop {
        let n = file
            .read(&mut buffer)
            .await
            .fs_context("reading file for hash calculation", path)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
        total += n as u64;
    }
    Ok(total)
}
