//! Windows application image.
//!
//! ```text
//! <out>/<name.fs>/
//!   <name.fs>.exe | <name.fs>.cmd   launcher
//!   <name.fs>.ico                   launcher icon, if any
//!   app/<name.fs>.cfg               launcher config
//!   app/...                         application resources
//!   runtime/                        bundled runtime, if any
//! ```

use super::{ICON_ICO, is_reserved_name};
use crate::bundler::{
    BundleType, Bundler, Platform,
    error::{Error, Result},
    image::{
        self, cfg,
        launcher::{self, LauncherLayout},
    },
    params::{ParamInfo, ParamMap, standard::*},
    utils::fs,
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

const RUNTIME_LOCATION: &str = "$APPDIR\\runtime";

/// Builds `windows.app` images.
#[derive(Debug, Clone)]
pub struct WinAppBundler {
    host: Platform,
}

impl Default for WinAppBundler {
    fn default() -> Self {
        Self::for_host(Platform::current())
    }
}

impl WinAppBundler {
    /// A bundler that validates as if running on `host`.
    pub fn for_host(host: Platform) -> Self {
        Self { host }
    }

    pub(super) fn validate_image(&self, params: &mut ParamMap) -> Result<()> {
        image::require_host(self.host, Platform::Windows)?;
        image::validate_runtime(params)?;
        image::validate_image(params)?;

        let mut names = vec![APP_FS_NAME.require(params)?];
        for mut secondary in image::secondary_launchers(params)? {
            names.push(APP_FS_NAME.require(&mut secondary)?);
        }
        if let Some(name) = names.iter().find(|n| is_reserved_name(n)) {
            return Err(Error::config(
                format!("The launcher name \"{name}\" is a reserved Windows device name."),
                "Change the application or launcher name so it is not one of CON, PRN, AUX, NUL, \
                 COM1-COM9 or LPT1-LPT9.",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Bundler for WinAppBundler {
    fn name(&self) -> &'static str {
        "Windows Application Image"
    }

    fn id(&self) -> &'static str {
        "windows.app"
    }

    fn description(&self) -> &'static str {
        "A directory based image of a Windows application with an optionally co-bundled runtime. \
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
        log::info!(
            "Creating app bundle: {} in {}",
            APP_NAME.require(params)?,
            outdir.display()
        );
        let root = build_image(params, outdir).await?;
        log::info!("✓ Created app image: {}", root.display());
        Ok(root)
    }
}

pub(super) fn app_params() -> Vec<&'static dyn ParamInfo> {
    vec![
        &APP_NAME,
        &APP_RESOURCES,
        &ARGUMENTS,
        &CLASSPATH,
        &ICON_ICO,
        &JVM_OPTIONS,
        &JVM_PROPERTIES,
        &MAIN_CLASS,
        &MAIN_JAR,
        &MODULE,
        &PREFERENCES_ID,
        &PRELOADER,
        &USER_JVM_OPTIONS,
        &VERSION,
        &RUNTIME,
        &LAUNCHER,
        &ENABLE_APP_CDS,
        &APP_CDS_CACHE_MODE,
        &APP_CDS_CLASS_ROOTS,
    ]
}

/// Assembles the image below `outdir` and returns its root directory.
pub(super) async fn build_image(params: &mut ParamMap, outdir: &Path) -> Result<PathBuf> {
    let root = outdir.join(APP_FS_NAME.require(params)?);
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
        Platform::Windows,
    )
    .await?;
    launcher::write_launcher(params, root, LauncherLayout::FLAT, Platform::Windows).await?;

    if let Some(icon) = ICON_ICO.fetch(params)? {
        fs::copy_file(&icon, &root.join(format!("{fs_name}.ico"))).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::params::RelativeFileSet;

    fn minimal(resources: &Path) -> ParamMap {
        std::fs::write(resources.join("hello.jar"), b"jar").unwrap();
        let mut params = ParamMap::new();
        params.insert("name", "Hello");
        params.insert("applicationClass", "com.example.Hello");
        params.insert("appResources", RelativeFileSet::from_dir(resources).unwrap());
        params.insert_null("dropinResourcesRoot");
        params
    }

    #[test]
    fn reserved_launcher_name_is_rejected() {
        let resources = tempfile::tempdir().unwrap();
        let mut params = minimal(resources.path());
        params.insert("name", "CON");
        let err = WinAppBundler::for_host(Platform::Windows)
            .validate(&mut params)
            .unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("\"CON\""));
    }

    #[test]
    fn reserved_secondary_launcher_is_rejected() {
        let resources = tempfile::tempdir().unwrap();
        let mut params = minimal(resources.path());
        let extra: ParamMap = [("name", "aux")].into_iter().collect();
        params.insert("secondaryLaunchers", vec![extra]);
        let err = WinAppBundler::for_host(Platform::Windows)
            .validate(&mut params)
            .unwrap_err();
        assert!(err.to_string().contains("\"aux\""));
    }

    #[test]
    fn refuses_other_hosts() {
        let resources = tempfile::tempdir().unwrap();
        let mut params = minimal(resources.path());
        let err = WinAppBundler::for_host(Platform::Linux)
            .validate(&mut params)
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedPlatform));
    }

    #[tokio::test]
    async fn image_layout() {
        let resources = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let icon = resources.path().join("hello.ico");
        std::fs::write(&icon, b"ico").unwrap();
        let mut params = minimal(resources.path());
        params.insert("icon", icon);

        let root = build_image(&mut params, out.path()).await.unwrap();
        assert_eq!(root, out.path().join("Hello"));
        assert!(root.join("Hello.cmd").is_file());
        assert!(root.join("Hello.ico").is_file());
        assert!(root.join("app/hello.jar").is_file());

        let cfg = std::fs::read_to_string(root.join("app/Hello.cfg")).unwrap();
        assert!(cfg.contains("app.runtime=$APPDIR\\runtime"));
    }
}
