//! Debian package bundler.
//!
//! Stages the package tree under the build root and runs
//! `fakeroot dpkg-deb -b`:
//!
//! ```text
//! <buildRoot>/linux-deb.image/<package>-<version>/
//!   DEBIAN/{control, preinst, prerm, postinst, postrm, copyright, md5sums}
//!   opt/<name.fs>/...        application image plus desktop files
//! ```

use super::{
    BUNDLE_NAME, FULL_PACKAGE_NAME, LICENSE_TEXT, LinuxAppBundler, MAINTAINER, app,
    check_bundle_name, deb_arch, desktop, installed_size_kb, installer_params, template,
    validate_file_associations, validate_license_files, validate_service,
};
use crate::bundler::{
    BundleType, Bundler, Platform,
    builder::tool_detection::{HAS_DPKG_DEB, HAS_FAKEROOT},
    error::{Error, ErrorExt, Result},
    params::{ParamInfo, ParamMap, standard::*},
    utils::{fs, process, template as resources},
};
use async_trait::async_trait;
use path_absolutize::Absolutize;
use serde::Serialize;
use std::{
    fmt::Write as _,
    path::{Path, PathBuf},
};

const NAME_PATTERN: &str = r"^[a-z][a-z\d+\-.]+$";

const NAME_ADVICE: &str = "Set the \"linux.bundleName\" parameter to a valid Debian package name. \
    Note that the package names must consist only of lower case letters (a-z), digits (0-9), \
    plus (+) and minus (-) signs, and periods (.). They must be at least two characters long \
    and must start with an alphanumeric character.";

/// Builds `.deb` installers.
#[derive(Debug, Clone)]
pub struct DebBundler {
    host: Platform,
}

impl Default for DebBundler {
    fn default() -> Self {
        Self::for_host(Platform::current())
    }
}

impl DebBundler {
    /// A bundler that validates as if running on `host`.
    pub fn for_host(host: Platform) -> Self {
        Self { host }
    }
}

#[derive(Serialize)]
struct ControlData {
    package: String,
    fs_name: String,
    launcher: String,
    version: String,
    section: &'static str,
    maintainer: String,
    arch: &'static str,
    installed_size: u64,
    summary: String,
    description: String,
    copyright: String,
    license_text: String,
    menu: bool,
    service: bool,
    start_on_install: bool,
    stop_on_uninstall: bool,
    run_at_startup: bool,
    app_cds_cache: bool,
    #[serde(flatten)]
    integration: desktop::Integration,
}

#[async_trait]
impl Bundler for DebBundler {
    fn name(&self) -> &'static str {
        "Linux DEB Installer"
    }

    fn id(&self) -> &'static str {
        "deb"
    }

    fn description(&self) -> &'static str {
        "Linux Debian Bundle."
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
        validate_license_files(params, "Debian")?;
        validate_service(params)?;
        validate_file_associations(params)?;

        if !*HAS_DPKG_DEB {
            return Err(Error::config(
                "Can not find dpkg-deb.",
                "Please install required packages.",
            ));
        }
        if !*HAS_FAKEROOT {
            return Err(Error::config(
                "Can not find fakeroot.",
                "Please install required packages.",
            ));
        }
        Ok(())
    }

    async fn execute(&self, params: &mut ParamMap, outdir: &Path) -> Result<PathBuf> {
        let full_name = FULL_PACKAGE_NAME.require(params)?;
        let staging = BUILD_ROOT
            .require(params)?
            .join("linux-deb.image")
            .join(&full_name);
        fs::create_dir_all(&staging, true).await?;

        stage_package(params, &staging).await?;

        fs::create_dir_all(outdir, false).await?;
        let deb = outdir.join(format!("{full_name}.deb"));
        let deb = deb
            .absolutize()
            .fs_context("resolving output path", &deb)?
            .into_owned();
        log::info!("Generating DEB for installer to: {}", deb.display());

        let mut command = tokio::process::Command::new("fakeroot");
        command.arg("dpkg-deb").arg("-b").arg(&full_name).arg(&deb);
        if let Some(parent) = staging.parent() {
            command.current_dir(parent);
        }
        process::run(&mut command).await?;

        if VERBOSE.fetch(params)?.unwrap_or(false) {
            log::info!(
                "Config files are saved to {}. Use them to customize package.",
                staging.join("DEBIAN").display()
            );
        } else {
            fs::remove_dir_all(&staging).await?;
        }

        log::info!("✓ Created deb package: {}", deb.display());
        Ok(deb)
    }
}

/// Builds the image under `opt/` and writes the `DEBIAN` control files.
async fn stage_package(params: &mut ParamMap, staging: &Path) -> Result<()> {
    let root = app::build_image(params, &staging.join("opt")).await?;
    let integration = desktop::write_desktop_files(params, &root).await?;

    let package = BUNDLE_NAME.require(params)?;
    let service = SERVICE_HINT.fetch(params)?.unwrap_or(false);
    let data = ControlData {
        package: package.clone(),
        fs_name: APP_FS_NAME.require(params)?,
        launcher: APP_FS_NAME.require(params)?,
        version: VERSION.require(params)?,
        section: "misc",
        maintainer: MAINTAINER.require(params)?,
        arch: deb_arch(),
        installed_size: installed_size_kb(&root),
        summary: TITLE.fetch(params)?.unwrap_or_else(|| package.clone()),
        description: control_description(&DESCRIPTION.require(params)?),
        copyright: COPYRIGHT.require(params)?,
        license_text: LICENSE_TEXT.require(params)?,
        menu: MENU_HINT.fetch(params)?.unwrap_or(true),
        service,
        start_on_install: START_ON_INSTALL.fetch(params)?.unwrap_or(false),
        stop_on_uninstall: STOP_ON_UNINSTALL.fetch(params)?.unwrap_or(true),
        run_at_startup: RUN_AT_STARTUP.fetch(params)?.unwrap_or(false),
        app_cds_cache: app_cds_cache_on_install(params)?,
        integration,
    };

    let dropin = DROP_IN_RESOURCES_ROOT.fetch(params)?;
    let dropin = dropin.as_deref();
    let debian = staging.join("DEBIAN");

    let control = resources::render("control", "DEB control file", template::CONTROL, &data, dropin)?;
    fs::write_file(&debian.join("control"), control).await?;

    for (name, category, source) in [
        ("preinst", "DEB preinstall script", template::PREINST),
        ("prerm", "DEB prerm script", template::PRERM),
        ("postinst", "DEB postinstall script", template::POSTINST),
        ("postrm", "DEB postrm script", template::POSTRM),
    ] {
        let script = resources::render(name, category, source, &data, dropin)?;
        let path = debian.join(name);
        fs::write_file(&path, script).await?;
        fs::set_executable(&path).await?;
    }

    let copyright =
        resources::render("copyright", "DEB copyright file", template::COPYRIGHT, &data, dropin)?;
    fs::write_file(&debian.join("copyright"), copyright).await?;

    if service {
        let init = resources::render(
            &format!("{package}.init"),
            "DEB init script",
            template::INIT_SCRIPT,
            &data,
            dropin,
        )?;
        let path = root.join(format!("{package}.init"));
        fs::write_file(&path, init).await?;
        fs::set_executable(&path).await?;
    }

    let sums = md5sums(staging.to_path_buf()).await?;
    fs::write_file(&debian.join("md5sums"), sums).await?;
    Ok(())
}

/// Multi-line control descriptions continue with a leading space; blank
/// lines become ` .`.
fn control_description(description: &str) -> String {
    description
        .lines()
        .map(|line| {
            if line.trim().is_empty() {
                " .".to_string()
            } else {
                format!(" {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `md5sums` content for every payload file outside `DEBIAN/`.
async fn md5sums(staging: PathBuf) -> Result<String> {
    tokio::task::spawn_blocking(move || -> Result<String> {
        let mut out = String::new();
        let mut files: Vec<_> = walkdir::WalkDir::new(&staging)
            .into_iter()
            .filter_entry(|e| e.file_name() != "DEBIAN" || e.depth() != 1)
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .collect();
        files.sort();
        for file in files {
            let bytes = std::fs::read(&file).fs_context("reading file for md5sums", &file)?;
            let relative = file.strip_prefix(&staging)?;
            let _ = writeln!(
                out,
                "{:x}  {}",
                md5::compute(&bytes),
                relative.to_string_lossy().replace('\\', "/")
            );
        }
        Ok(out)
    })
    .await
    .map_err(|e| Error::GenericError(format!("md5sums task panicked: {e}")))?
}
