//! Disk image staging and `hdiutil create`.

use crate::bundler::{
    error::{Context, Error, Result},
    utils::{fs, process},
};
use std::path::Path;

/// Copies the bundle into `staging` and adds the `Applications` symlink.
pub(super) async fn stage_contents(bundle: &Path, staging: &Path) -> Result<()> {
    let name = bundle
        .file_name()
        .ok_or_else(|| Error::GenericError(format!("Invalid app bundle path {}", bundle.display())))?;
    let staged = staging.join(name);
    log::debug!("Copying .app to staging: {}", staged.display());
    fs::copy_dir(bundle, &staged)
        .await
        .with_context(|| format!("copying .app bundle to staging directory: {}", staged.display()))?;

    #[cfg(unix)]
    {
        use crate::bundler::error::ErrorExt;
        let link = staging.join("Applications");
        std::os::unix::fs::symlink("/Applications", &link)
            .fs_context("creating Applications symlink", &link)?;
    }
    Ok(())
}

/// Creates a compressed HFS+ image of `bundle` at `dmg`, replacing any previous one.
pub(super) async fn create_dmg(bundle: &Path, volume_name: &str, dmg: &Path) -> Result<()> {
    match tokio::fs::remove_file(dmg).await {
        Ok(()) => log::debug!("Removed previous {}", dmg.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(Error::GenericError(format!("removing {}: {e}", dmg.display()))),
    }

    let staging = tempfile::tempdir().map_err(|e| {
        Error::GenericError(format!("Failed to create temporary directory for DMG contents: {e}"))
    })?;
    stage_contents(bundle, staging.path()).await?;

    log::info!("Creating DMG with format UDZO...");
    let mut command = tokio::process::Command::new("hdiutil");
    command
        .arg("create")
        .arg("-srcfolder")
        .arg(staging.path())
        .arg("-volname")
        .arg(volume_name)
        .args(["-ov", "-fs", "HFS+J", "-format", "UDZO"])
        .arg(dmg);
    process::run(&mut command).await?;
    Ok(())
}
