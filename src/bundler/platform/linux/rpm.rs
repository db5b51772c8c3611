//! RPM package bundler.
//!
//! The image is staged as the spec file's source directory; `rpmbuild -bb`
//! copies it to `/opt` in the build root and writes the package straight
//! into the output directory.

use super::{
    BUNDLE_NAME, LinuxAppBundler, app, check_bundle_name, desktop, installer_params,
    rpm_arch, template, validate_file_associations, validate_license_files,
};
use crate::bundler::{
    BundleType, Bundler, Platform,
    builder::tool_detection::HAS_RPMBUILD,
    error::{Error, ErrorExt, Result},
    params::{ParamInfo, ParamMap, standard::*},
    utils::{fs, process, template as resources},
};
use async_trait::async_trait;
use path_absolutize::Absolutize;
use serde::Serialize;
use std::path::{Path, PathBuf};

const NAME_PATTERN: &str = r"^[a-zA-Z][a-zA-Z0-9+._-]*$";

const NAME_ADVICE: &str = "Set the \"linux.bundleName\" parameter to a valid RPM package name. \
    Package names must start with a letter and may contain letters, digits, plus (+), \
    minus (-), underscores (_) and periods (.).";

/// Builds `.rpm` installers.
#[derive(Debug, Clone)]
pub struct RpmBundler {
    host: Platform,
}

impl Default for RpmBundler {
    fn default() -> Self {
        Self::for_host(Platform::current())
    }
}

impl RpmBundler {
    /// A bundler that validates as if running on `host`.
    pub fn for_host(host: Platform) -> Self {
        Self { host }
    }
}

#[derive(Serialize)]
struct SpecData {
    package: String,
    fs_name: String,
    launcher: String,
    version: String,
    summary: String,
    description: String,
    license_type: String,
    license_file: Option<String>,
    vendor: String,
    arch: &'static str,
    menu: bool,
    #[serde(flatten)]
    integration: desktop::Integration,
}

#[async_trait]
impl Bundler for RpmBundler {
    fn name(&self) -> &'static str {
        "Linux RPM Installer"
    }

    fn id(&self) -> &'static str {
        "rpm"
    }

    fn description(&self) -> &'static str {
        "Linux RPM Bundle."
    }

    fn bundle_type(&self) -> BundleType {
        BundleType::Installer
    }

    fn params(&self) -> Vec<&'static dyn ParamInfo> {
        let mut params = app::app_params();
        params.extend(installer_params());
        params
    }

    fn validate(&self, params: &mut ParamMap) -> Result<()> {
        LinuxAppBundler::for_host(self.host).validate_image(params)?;

        check_bundle_name(&BUNDLE_NAME.require(params)?, NAME_PATTERN, NAME_ADVICE)?;
        let version = VERSION.require(params)?;
        if version.contains('-') {
            return Err(Error::config(
                format!("Invalid value \"{version}\" for the RPM version."),
                "RPM versions may not contain '-'. Set \"appVersion\" to a version such as 1.2.3.",
            ));
        }
        validate_license_files(params, "RPM")?;
        if SERVICE_HINT.fetch(params)?.unwrap_or(false) {
            return Err(Error::config(
                "The RPM bundler does not install services.",
                "Unset \"serviceHint\" or use the deb bundler.",
            ));
        }
        validate_file_associations(params)?;

        if !*HAS_RPMBUILD {
            return Err(Error::config(
                "Can not find rpmbuild.",
                "Please install required packages.",
            ));
        }
        Ok(())
    }

    async fn execute(&self, params: &mut ParamMap, outdir: &Path) -> Result<PathBuf> {
        let package = BUNDLE_NAME.require(params)?;
        let version = VERSION.require(params)?;
        let staging = BUILD_ROOT.require(params)?.join("linux-rpm.image");
        fs::create_dir_all(&staging, true).await?;

        let spec = stage_package(params, &staging).await?;

        fs::create_dir_all(outdir, false).await?;
        let outdir = outdir
            .absolutize()
            .fs_context("resolving output path", outdir)?
            .into_owned();
        let file_name = format!("{package}-{version}-1.{}.rpm", rpm_arch());
        log::info!("Generating RPM for installer to: {}", outdir.join(&file_name).display());

        let mut command = tokio::process::Command::new("rpmbuild");
        command
            .arg("-bb")
            .arg(&spec)
            .arg("--define")
            .arg(format!("%_sourcedir {}", staging.join("SOURCES").display()))
            .arg("--define")
            .arg(format!("%_topdir {}", staging.display()))
            .arg("--define")
            .arg(format!("%_rpmdir {}", outdir.display()))
            .arg("--define")
            .arg(format!("%_rpmfilename {file_name}"));
        process::run(&mut command).await?;

        if !VERBOSE.fetch(params)?.unwrap_or(false) {
            fs::remove_dir_all(&staging).await?;
        }

        let rpm = outdir.join(file_name);
        log::info!("✓ Created rpm package: {}", rpm.display());
        Ok(rpm)
    }
}

/// Builds the image under `SOURCES/` and writes the spec file, returning its path.
async fn stage_package(params: &mut ParamMap, staging: &Path) -> Result<PathBuf> {
    let root = app::build_image(params, &staging.join("SOURCES")).await?;
    let integration = desktop::write_desktop_files(params, &root).await?;

    let package = BUNDLE_NAME.require(params)?;
    let data = SpecData {
        package: package.clone(),
        fs_name: APP_FS_NAME.require(params)?,
        launcher: APP_FS_NAME.require(params)?,
        version: VERSION.require(params)?,
        summary: TITLE.fetch(params)?.unwrap_or_else(|| package.clone()),
        description: DESCRIPTION.require(params)?,
        license_type: LICENSE_TYPE.require(params)?,
        license_file: LICENSE_FILE.fetch(params)?.unwrap_or_default().into_iter().next(),
        vendor: VENDOR.require(params)?,
        arch: rpm_arch(),
        menu: MENU_HINT.fetch(params)?.unwrap_or(true),
        integration,
    };

    let dropin = DROP_IN_RESOURCES_ROOT.fetch(params)?;
    let spec_name = format!("{package}.spec");
    let spec = resources::render(
        &spec_name,
        "RPM spec file",
        template::RPM_SPEC,
        &data,
        dropin.as_deref(),
    )?;
    let path = staging.join("SPECS").join(spec_name);
    fs::write_file(&path, spec).await?;
    Ok(path)
}
