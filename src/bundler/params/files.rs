//! Relative file sets: a base directory plus files addressed relative to it.

use crate::bundler::error::{Error, Result};
use std::{
    collections::BTreeSet,
    fmt,
    path::{Path, PathBuf},
};

/// A base directory and the files beneath it that belong to a bundle.
///
/// Paths are stored relative to `base`, using `/` separators, so
/// `contains("legal/java.base/LICENSE")` works the same on every host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelativeFileSet {
    base: PathBuf,
    files: BTreeSet<String>,
}

impl RelativeFileSet {
    /// Builds a set from absolute or base-relative file paths.
    ///
    /// Files outside `base` are rejected.
    pub fn new<I, P>(base: impl Into<PathBuf>, files: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let base = base.into();
        let mut set = BTreeSet::new();
        for file in files {
            let file = file.as_ref();
            let relative = if file.is_absolute() || file.starts_with(&base) {
                file.strip_prefix(&base).map_err(|_| {
                    Error::GenericError(format!(
                        "{} is not inside {}",
                        file.display(),
                        base.display()
                    ))
                })?
            } else {
                file
            };
            set.insert(to_slash(relative));
        }
        Ok(Self { base, files: set })
    }

    /// Every regular file below `dir`, recursively.
    pub fn from_dir(dir: impl Into<PathBuf>) -> Result<Self> {
        let base = dir.into();
        let mut files = BTreeSet::new();
        for entry in walkdir::WalkDir::new(&base).follow_links(true) {
            let entry = entry?;
            if entry.file_type().is_file() {
                files.insert(to_slash(entry.path().strip_prefix(&base)?));
            }
        }
        Ok(Self { base, files })
    }

    /// The base directory.
    pub fn base_directory(&self) -> &Path {
        &self.base
    }

    /// Files relative to the base directory, in sorted order.
    pub fn included_files(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(String::as_str)
    }

    /// Whether `relative` is part of the set.
    pub fn contains(&self, relative: &str) -> bool {
        self.files.contains(&relative.replace('\\', "/"))
    }

    /// Absolute location of a member file.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.base.join(relative)
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// True when the set has no files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl fmt::Display for RelativeFileSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} files)", self.base.display(), self.files.len())
    }
}

fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
