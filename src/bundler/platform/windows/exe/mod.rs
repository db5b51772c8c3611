//! Windows `.exe` installer built with Inno Setup.
//!
//! The application image is staged under `<buildRoot>/win-exe.image`, a
//! project file `<name.fs>.iss` is rendered next to it and `iscc` compiles
//! the installer into the output directory.
//!
//! - `template` - built-in Inno Setup project
//! - `script` - project rendering
//! - `build` - `iscc` execution and artifact lookup
//! - `utils` - escaping, version and architecture helpers

mod build;
mod script;
mod template;
mod utils;

use super::app::{self, WinAppBundler};
use crate::bundler::{
    BundleType, Bundler, Platform,
    builder::tool_detection::{INNO_SETUP, inno_setup_major},
    error::{Error, ErrorExt, Result},
    params::{BundlerParam, ParamInfo, ParamMap, parse::parse_optional_bool, standard::*},
    utils::{fs, process, template as resources},
};
use async_trait::async_trait;
use path_absolutize::Absolutize;
use std::{
    marker::PhantomData,
    path::{Path, PathBuf},
};

const MIN_INNO_SETUP: u32 = 5;
const MAX_COPYRIGHT: usize = 100;

pub static EXE_SYSTEM_WIDE: BundlerParam<bool> = BundlerParam {
    id: "win.exe.systemWide",
    name: "System Wide",
    description: "Install for all users instead of the current user. Defaults to systemWide, else per user.",
    default: |p| Ok(Some(SYSTEM_WIDE.fetch(p)?.unwrap_or(false))),
    parser: Some(|s, _| Ok(parse_optional_bool(s))),
    kind: PhantomData,
};

pub static EXE_IMAGE_DIR: BundlerParam<PathBuf> = BundlerParam {
    id: "win.exe.imageDir",
    name: "Image Directory",
    description: "Staging directory for the installer image and project file.",
    default: |p| Ok(Some(BUILD_ROOT.require(p)?.join("win-exe.image"))),
    parser: Some(|s, _| Ok(Some(PathBuf::from(s)))),
    kind: PhantomData,
};

pub static MENU_GROUP: BundlerParam<String> = BundlerParam {
    id: "win.menuGroup",
    name: "Menu Group",
    description: "Start menu group holding the shortcuts. Defaults to the vendor.",
    default: |p| VENDOR.fetch(p),
    parser: Some(|s, _| Ok(Some(s.to_string()))),
    kind: PhantomData,
};

pub static INSTALLER_FILE_NAME: BundlerParam<String> = BundlerParam {
    id: "win.installerName",
    name: "Installer File Name",
    description: "Installer file name without extension. Defaults to <name.fs>-<version>.",
    default: |p| {
        Ok(Some(format!(
            "{}-{}",
            APP_FS_NAME.require(p)?,
            VERSION.require(p)?
        )))
    },
    parser: Some(|s, _| Ok(Some(s.to_string()))),
    kind: PhantomData,
};

pub static REGISTRY_NAME: BundlerParam<String> = BundlerParam {
    id: "win.registryName",
    name: "Registry Name",
    description: "Prefix of the file association classes in the registry. Defaults to the alphanumeric part of name.fs.",
    default: |p| {
        Ok(Some(
            APP_FS_NAME
                .require(p)?
                .chars()
                .filter(char::is_ascii_alphanumeric)
                .collect(),
        ))
    },
    parser: Some(|s, _| Ok(Some(s.to_string()))),
    kind: PhantomData,
};

/// Builds Inno Setup `.exe` installers.
#[derive(Debug, Clone)]
pub struct ExeBundler {
    host: Platform,
}

impl Default for ExeBundler {
    fn default() -> Self {
        Self::for_host(Platform::current())
    }
}

impl ExeBundler {
    /// A bundler that validates as if running on `host`.
    pub fn for_host(host: Platform) -> Self {
        Self { host }
    }
}

#[async_trait]
impl Bundler for ExeBundler {
    fn name(&self) -> &'static str {
        "Windows EXE Installer"
    }

    fn id(&self) -> &'static str {
        "exe"
    }

    fn description(&self) -> &'static str {
        "Microsoft Windows EXE Installer, via Inno Setup."
    }

    fn bundle_type(&self) -> BundleType {
        BundleType::Installer
    }

    fn params(&self) -> Vec<&'static dyn ParamInfo> {
        let mut params = app::app_params();
        params.extend([
            &DESCRIPTION as &'static dyn ParamInfo,
            &COPYRIGHT,
            &LICENSE_FILE,
            &MENU_GROUP,
            &MENU_HINT,
            &SHORTCUT_HINT,
            &SYSTEM_WIDE,
            &EXE_SYSTEM_WIDE,
            &TITLE,
            &VENDOR,
            &INSTALLDIR_CHOOSER,
            &INSTALLER_FILE_NAME,
            &FILE_ASSOCIATIONS,
            &SECONDARY_LAUNCHERS,
        ]);
        params
    }

    fn validate(&self, params: &mut ParamMap) -> Result<()> {
        WinAppBundler::for_host(self.host).validate_image(params)?;

        // derived entries last, so a newline is reported on the key the user set
        for param in [
            &APP_NAME, &COPYRIGHT, &DESCRIPTION, &TITLE, &VENDOR, &VERSION, &MENU_GROUP,
        ] {
            let value = param.fetch(params)?.unwrap_or_default();
            if value.contains(['\n', '\r']) {
                return Err(Error::config(
                    format!("Parameter '{}' cannot contain a newline.", param.id),
                    format!(
                        "Change the value of '{}' so that it does not contain any newlines.",
                        param.id
                    ),
                ));
            }
        }

        if COPYRIGHT.require(params)?.chars().count() > MAX_COPYRIGHT {
            return Err(Error::config(
                "The copyright string is too long for InnoSetup.",
                "Provide a copyright string shorter than 100 characters.",
            ));
        }

        if params.contains_key(LICENSE_FILE.id) {
            let resources = APP_RESOURCES_LIST.fetch(params)?.unwrap_or_default();
            for license in LICENSE_FILE.fetch(params)?.unwrap_or_default() {
                if !resources.iter().any(|set| set.contains(&license)) {
                    return Err(Error::config(
                        "Specified license file is missing.",
                        format!(
                            "Make sure that \"{license}\" references a file in the app resources, \
                             and that it is relative file reference."
                        ),
                    ));
                }
            }
        }

        if SERVICE_HINT.fetch(params)?.unwrap_or(false) {
            return Err(Error::config(
                "The EXE bundler does not install services.",
                "Unset \"serviceHint\".",
            ));
        }

        let version = INNO_SETUP.as_ref().map(|(_, v)| v.as_str());
        if version.and_then(inno_setup_major).unwrap_or(0) < MIN_INNO_SETUP {
            if let Some(version) = version {
                log::info!(
                    "Detected [iscc.exe] version {version} but version {MIN_INNO_SETUP} is required."
                );
            }
            return Err(Error::config(
                "Can not find Inno Setup Compiler (iscc.exe).",
                "Download Inno Setup 5 or later from http://www.jrsoftware.org and add it to the PATH.",
            ));
        }
        Ok(())
    }

    async fn execute(&self, params: &mut ParamMap, outdir: &Path) -> Result<PathBuf> {
        let Some((iscc, _)) = INNO_SETUP.as_ref() else {
            return Err(Error::config(
                "Can not find Inno Setup Compiler (iscc.exe).",
                "Download Inno Setup 5 or later from http://www.jrsoftware.org and add it to the PATH.",
            ));
        };
        log::info!("Building EXE installer for {}", APP_NAME.require(params)?);

        let image_dir = EXE_IMAGE_DIR.require(params)?;
        let project = stage_project(params, &image_dir).await?;

        fs::create_dir_all(outdir, false).await?;
        let outdir = outdir
            .absolutize()
            .fs_context("resolving output path", outdir)?
            .into_owned();
        build::run_iscc(iscc, &project, &outdir, &image_dir).await?;
        let installer = build::newest_exe(&outdir)?;

        if VERBOSE.fetch(params)?.unwrap_or(false) {
            log::info!("Kept working directory: {}", image_dir.display());
        } else {
            fs::remove_dir_all(&image_dir).await?;
        }

        log::info!("✓ Created EXE installer: {}", installer.display());
        Ok(installer)
    }
}

/// Stages the image and its Inno Setup project in `image_dir`, returning the
/// project path.
async fn stage_project(params: &mut ParamMap, image_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(image_dir, true).await?;

    if !MENU_HINT.fetch(params)?.unwrap_or(true) && !SHORTCUT_HINT.fetch(params)?.unwrap_or(false)
    {
        log::debug!("At least one type of shortcut is required. Enabling menu shortcut.");
        MENU_HINT.set(params, true);
    }

    let root = app::build_image(params, image_dir).await?;

    let mut license_name = None;
    if let Some(license) = LICENSE_FILE.fetch(params)?.unwrap_or_default().first() {
        let resources = APP_RESOURCES_LIST.fetch(params)?.unwrap_or_default();
        if let Some(set) = resources.iter().find(|set| set.contains(license)) {
            let source = set.resolve(license);
            if let Some(name) = source.file_name() {
                fs::copy_file(&source, &image_dir.join(name)).await?;
                license_name = Some(name.to_string_lossy().into_owned());
            }
        }
    }

    for entry in FILE_ASSOCIATIONS.fetch(params)?.unwrap_or_default() {
        let mut assoc = params.clone();
        assoc.extend(&entry);
        if let Some(icon) = FA_ICON.fetch(&mut assoc)?.filter(|i| i.is_file()) {
            if let Some(name) = icon.file_name() {
                fs::copy_file(&icon, &root.join(name)).await?;
            }
        }
    }

    let fs_name = APP_FS_NAME.require(params)?;
    let dropin = DROP_IN_RESOURCES_ROOT.fetch(params)?;
    let wizard_name = format!("{fs_name}-setup-icon.bmp");
    let wizard_image =
        match resources::resource_file(&wizard_name, "setup dialog icon", None, dropin.as_deref()) {
            Some(bmp) => {
                fs::copy_file(&bmp, &image_dir.join(&wizard_name)).await?;
                Some(wizard_name)
            }
            None => None,
        };

    let iss = script::render_iss(params, image_dir, license_name, wizard_image)?;
    let project = image_dir.join(format!("{fs_name}.iss"));
    fs::write_utf8_bom(&project, &iss).await?;

    let post_image = format!("{fs_name}-post-image.wsf");
    if let Some(script) = resources::resource_file(
        &post_image,
        "script to run after application image is populated",
        None,
        dropin.as_deref(),
    ) {
        log::info!("Running WSH script on application image [{}]", script.display());
        let mut command = tokio::process::Command::new("wscript");
        command.arg(&script).current_dir(image_dir);
        process::run(&mut command).await?;
    }

    Ok(project)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::params::RelativeFileSet;

    fn params(resources: &Path) -> ParamMap {
        std::fs::write(resources.join("hello.jar"), b"jar").unwrap();
        std::fs::write(resources.join("LICENSE.txt"), b"MIT").unwrap();
        let mut params = ParamMap::new();
        params.insert("name", "Hello");
        params.insert("applicationClass", "com.example.Hello");
        params.insert("appResources", RelativeFileSet::from_dir(resources).unwrap());
        params.insert_null("dropinResourcesRoot");
        params
    }

    #[test]
    fn long_copyright_is_rejected() {
        let resources = tempfile::tempdir().unwrap();
        let mut params = params(resources.path());
        params.insert("copyright", "c".repeat(101));
        let err = ExeBundler::for_host(Platform::Windows)
            .validate(&mut params)
            .unwrap_err();
        assert_eq!(err.to_string(), "The copyright string is too long for InnoSetup.");
        assert_eq!(
            err.advice(),
            Some("Provide a copyright string shorter than 100 characters.")
        );
    }

    #[test]
    fn newline_in_vendor_is_rejected() {
        let resources = tempfile::tempdir().unwrap();
        let mut params = params(resources.path());
        params.insert("vendor", "Acme\nCorp");
        let err = ExeBundler::for_host(Platform::Windows)
            .validate(&mut params)
            .unwrap_err();
        assert_eq!(err.to_string(), "Parameter 'vendor' cannot contain a newline.");
    }

    #[test]
    fn newline_in_menu_group_is_rejected() {
        let resources = tempfile::tempdir().unwrap();
        let mut params = params(resources.path());
        params.insert("win.menuGroup", "Acme\r\nTools");
        let err = ExeBundler::for_host(Platform::Windows)
            .validate(&mut params)
            .unwrap_err();
        assert_eq!(err.to_string(), "Parameter 'win.menuGroup' cannot contain a newline.");
    }

    #[test]
    fn license_must_be_a_resource() {
        let resources = tempfile::tempdir().unwrap();
        let mut params = params(resources.path());
        params.insert("licenseFile", "COPYING");
        let err = ExeBundler::for_host(Platform::Windows)
            .validate(&mut params)
            .unwrap_err();
        assert_eq!(err.to_string(), "Specified license file is missing.");
    }

    #[tokio::test]
    async fn project_is_staged_with_bom_and_license() {
        let resources = tempfile::tempdir().unwrap();
        let staging = tempfile::tempdir().unwrap();
        let mut params = params(resources.path());
        params.insert("licenseFile", "LICENSE.txt");
        params.insert("menuHint", "false");

        let project = stage_project(&mut params, staging.path()).await.unwrap();
        assert_eq!(project, staging.path().join("Hello.iss"));
        assert!(staging.path().join("Hello/app/hello.jar").is_file());
        assert!(staging.path().join("LICENSE.txt").is_file());

        let bytes = std::fs::read(&project).unwrap();
        assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);
        let iss = String::from_utf8_lossy(&bytes[3..]);
        assert!(iss.contains("LicenseFile=LICENSE.txt"));
        assert!(iss.contains("Name: \"{group}\\Hello\""));
    }
}
