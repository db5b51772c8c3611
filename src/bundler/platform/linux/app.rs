//! Linux application image.
//!
//! ```text
//! <out>/<name.fs>/
//!   <name.fs>            launcher
//!   app/<name.fs>.cfg    launcher config
//!   app/...              application resources
//!   runtime/             bundled runtime, if any
//!   resources/<name.fs>.png
//! ```

use super::ICON_PNG;
use crate::bundler::{
    BundleType, Bundler, Platform,
    error::Result,
    image::{
        self, cfg,
        launcher::{self, LauncherLayout},
    },
    params::{ParamInfo, ParamMap, standard::*},
    utils::fs,
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

const RUNTIME_LOCATION: &str = "$APPDIR/runtime";

/// Builds `linux.app` images.
#[derive(Debug, Clone)]
pub struct LinuxAppBundler {
    host: Platform,
}

impl Default for LinuxAppBundler {
    fn default() -> Self {
        Self::for_host(Platform::current())
    }
}

impl LinuxAppBundler {
    /// A bundler that validates as if running on `host`.
    pub fn for_host(host: Platform) -> Self {
        Self { host }
    }

    /// Validation shared with the installers built on top of the image.
    pub(super) fn validate_image(&self, params: &mut ParamMap) -> Result<()> {
        image::require_host(self.host, Platform::Linux)?;
        image::validate_runtime(params)?;
        image::validate_image(params)
    }
}

#[async_trait]
impl Bundler for LinuxAppBundler {
    fn name(&self) -> &'static str {
        "Linux Application Image"
    }

    fn id(&self) -> &'static str {
        "linux.app"
    }

    fn description(&self) -> &'static str {
        "A directory based image of a Linux application with an optionally co-bundled runtime. \
         Used as a base for the installer bundlers."
    }

    fn bundle_type(&self) -> BundleType {
        BundleType::Image
    }

    fn params(&self) -> Vec<&'static dyn ParamInfo> {
        app_params()
    }

    fn validate(&self, params: &mut ParamMap) -> Result<()> {
        self.validate_image(params)
    }

    async fn execute(&self, params: &mut ParamMap, outdir: &Path) -> Result<PathBuf> {
        let root = build_image(params, outdir).await?;
        log::info!("✓ Created app image: {}", root.display());
        Ok(root)
    }
}

/// Parameters read by the Linux image.
pub(super) fn app_params() -> Vec<&'static dyn ParamInfo> {
    vec![
        &APP_NAME,
        &APP_RESOURCES,
        &ARGUMENTS,
        &CLASSPATH,
        &JVM_OPTIONS,
        &JVM_PROPERTIES,
        &RUNTIME,
        &MAIN_CLASS,
        &MAIN_JAR,
        &MODULE,
        &PREFERENCES_ID,
        &PRELOADER,
        &USER_JVM_OPTIONS,
        &VERSION,
        &LAUNCHER,
        &ICON_PNG,
        &ENABLE_APP_CDS,
        &APP_CDS_CACHE_MODE,
        &APP_CDS_CLASS_ROOTS,
    ]
}

/// Assembles the image below `outdir` and returns its root directory.
pub(super) async fn build_image(params: &mut ParamMap, outdir: &Path) -> Result<PathBuf> {
    let fs_name = APP_FS_NAME.require(params)?;
    let root = outdir.join(&fs_name);
    fs::create_dir_all(&root, true).await?;

    let app_dir = root.join("app");
    fs::create_dir_all(&app_dir, false).await?;
    image::copy_application(params, &app_dir).await?;
    image::copy_runtime(params, &root.join("runtime")).await?;

    write_launcher_files(params, &root).await?;
    for mut secondary in image::secondary_launchers(params)? {
        write_launcher_files(&mut secondary, &root).await?;
    }

    Ok(root)
}

async fn write_launcher_files(params: &mut ParamMap, root: &Path) -> Result<()> {
    let fs_name = APP_FS_NAME.require(params)?;
    cfg::write_cfg(
        params,
        &root.join("app").join(format!("{fs_name}.cfg")),
        RUNTIME_LOCATION,
        Platform::Linux,
    )
    .await?;
    launcher::write_launcher(params, root, LauncherLayout::FLAT, Platform::Linux).await?;

    if let Some(icon) = ICON_PNG.fetch(params)? {
        fs::copy_file(&icon, &root.join("resources").join(format!("{fs_name}.png"))).await?;
    }
    Ok(())
}
