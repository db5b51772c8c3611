//! Inno Setup compilation.

use crate::bundler::{
    error::{Error, ErrorExt, Result},
    utils::process,
};
use std::{
    path::{Path, PathBuf},
    time::SystemTime,
};

/// Runs `iscc /o<outdir> <project>` from `work_dir`.
pub async fn run_iscc(iscc: &Path, project: &Path, outdir: &Path, work_dir: &Path) -> Result<()> {
    log::info!("Generating EXE for installer to: {}", outdir.display());
    let mut command = tokio::process::Command::new(iscc);
    command
        .arg(format!("/o{}", outdir.display()))
        .arg(project)
        .current_dir(work_dir);
    process::run(&mut command).await?;
    Ok(())
}

/// The `.exe` in `dir` with the newest modification time.
///
/// iscc names its output after the project, so the freshly built installer
/// is the most recently written one.
pub fn newest_exe(dir: &Path) -> Result<PathBuf> {
    let mut newest: Option<(SystemTime, PathBuf)> = None;
    for entry in std::fs::read_dir(dir).fs_context("listing installer output", dir)? {
        let entry = entry.fs_context("listing installer output", dir)?;
        let path = entry.path();
        let is_exe = path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("exe"));
        if !is_exe {
            continue;
        }
        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .fs_context("reading modification time", &path)?;
        if newest.as_ref().is_none_or(|(time, _)| modified > *time) {
            newest = Some((modified, path));
        }
    }
    newest
        .map(|(_, path)| path)
        .ok_or_else(|| Error::GenericError(format!("iscc did not write an installer to {}", dir.display())))
}
