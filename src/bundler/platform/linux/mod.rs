//! Linux bundlers: application image, Debian and RPM packages.
//!
//! Both installers install the image under `/opt/<name.fs>` and register a
//! menu entry through `xdg-desktop-menu`.

mod app;
mod deb;
mod desktop;
mod rpm;
mod template;

pub use app::LinuxAppBundler;
pub use deb::DebBundler;
pub use rpm::RpmBundler;

use crate::bundler::{
    error::{Error, Result},
    params::{BundlerParam, ParamInfo, ParamMap, standard::*},
};
use std::{marker::PhantomData, path::PathBuf};

/// The application icon when it is a PNG; other formats are ignored.
pub static ICON_PNG: BundlerParam<PathBuf> = BundlerParam {
    id: "icon.png",
    name: ".png Icon",
    description: "Icon for the application, in PNG format.",
    default: |p| {
        Ok(ICON.fetch(p)?.filter(|icon| {
            let png = icon
                .extension()
                .is_some_and(|e| e.eq_ignore_ascii_case("png"));
            if !png {
                log::warn!(
                    "The specified icon \"{}\" is not a PNG file and will not be used.",
                    icon.display()
                );
            }
            png
        }))
    },
    parser: Some(|s, _| Ok(Some(PathBuf::from(s)))),
    kind: PhantomData,
};

pub static BUNDLE_NAME: BundlerParam<String> = BundlerParam {
    id: "linux.bundleName",
    name: "Bundle Name",
    description: "The package name. Defaults to the lowercased name with spaces and underscores turned into dashes.",
    default: |p| {
        Ok(APP_NAME
            .fetch(p)?
            .map(|name| name.to_lowercase().replace([' ', '_'], "-")))
    },
    parser: Some(|s, _| Ok(Some(s.to_string()))),
    kind: PhantomData,
};

pub static FULL_PACKAGE_NAME: BundlerParam<String> = BundlerParam {
    id: "linux.deb.fullPackageName",
    name: "Full Package Name",
    description: "Package name plus version, used for the staging directory and artifact.",
    default: |p| {
        Ok(Some(format!(
            "{}-{}",
            BUNDLE_NAME.require(p)?,
            VERSION.require(p)?
        )))
    },
    parser: Some(|s, _| Ok(Some(s.to_string()))),
    kind: PhantomData,
};

pub static MAINTAINER: BundlerParam<String> = BundlerParam {
    id: "linux.deb.maintainer",
    name: "Maintainer",
    description: "Package maintainer. Defaults to \"<vendor> <<email>>\".",
    default: |p| {
        Ok(Some(format!(
            "{} <{}>",
            VENDOR.require(p)?,
            EMAIL.require(p)?
        )))
    },
    parser: Some(|s, _| Ok(Some(s.to_string()))),
    kind: PhantomData,
};

pub static LICENSE_TEXT: BundlerParam<String> = BundlerParam {
    id: "linux.deb.licenseText",
    name: "License Text",
    description: "Text of the first license file, or the license type when there is none.",
    default: |p| {
        if let Some(license) = LICENSE_FILE.fetch(p)?.unwrap_or_default().first() {
            for set in APP_RESOURCES_LIST.fetch(p)?.unwrap_or_default() {
                if set.contains(license) {
                    match std::fs::read_to_string(set.resolve(license)) {
                        Ok(text) => return Ok(Some(text)),
                        Err(e) => log::debug!("Could not read license {license}: {e}"),
                    }
                }
            }
        }
        LICENSE_TYPE.fetch(p)
    },
    parser: Some(|s, _| Ok(Some(s.to_string()))),
    kind: PhantomData,
};

pub static XDG_FILE_PREFIX: BundlerParam<String> = BundlerParam {
    id: "linux.xdg-prefix",
    name: "Prefix for XDG files (mime, desktop)",
    description: "Prefix for XDG MimeInfo and Desktop Files. Defaults to <vendor>-<name.fs>, with spaces dropped.",
    default: |p| {
        let vendor = if p.contains_key(VENDOR.id) {
            VENDOR.require(p)?
        } else {
            "app_packager".to_string()
        };
        let prefix = format!("{vendor}-{}", APP_FS_NAME.require(p)?);
        Ok(Some(prefix.split_whitespace().collect()))
    },
    parser: Some(|s, _| Ok(Some(s.to_string()))),
    kind: PhantomData,
};

pub static LINUX_CATEGORY: BundlerParam<String> = BundlerParam {
    id: "linux.category",
    name: "Menu Category",
    description: "freedesktop.org menu category of the desktop entry.",
    default: |p| {
        let category = CATEGORY.require(p)?;
        Ok(Some(if category == "Unknown" {
            "Utility".to_string()
        } else {
            category
        }))
    },
    parser: Some(|s, _| Ok(Some(s.to_string()))),
    kind: PhantomData,
};

/// Parameters the installers read on top of the image parameters.
fn installer_params() -> Vec<&'static dyn ParamInfo> {
    vec![
        &BUNDLE_NAME,
        &FULL_PACKAGE_NAME,
        &COPYRIGHT,
        &CATEGORY,
        &DESCRIPTION,
        &EMAIL,
        &LICENSE_FILE,
        &LICENSE_TYPE,
        &TITLE,
        &VENDOR,
        &MAINTAINER,
        &LICENSE_TEXT,
        &XDG_FILE_PREFIX,
        &LINUX_CATEGORY,
        &MENU_HINT,
        &SERVICE_HINT,
        &SYSTEM_WIDE,
        &START_ON_INSTALL,
        &STOP_ON_UNINSTALL,
        &RUN_AT_STARTUP,
        &FILE_ASSOCIATIONS,
        &SECONDARY_LAUNCHERS,
    ]
}

/// Checks a package name against a packaging naming rule.
fn check_bundle_name(name: &str, pattern: &str, advice: &str) -> Result<()> {
    let re = regex::Regex::new(pattern).map_err(|e| Error::GenericError(e.to_string()))?;
    if re.is_match(name) {
        Ok(())
    } else {
        Err(Error::config(
            format!("Invalid value \"{name}\" for the package name."),
            advice,
        ))
    }
}

/// Every license file must be a member of the application resources.
fn validate_license_files(params: &mut ParamMap, installer: &str) -> Result<()> {
    if !params.contains_key(LICENSE_FILE.id) {
        log::info!(
            "{installer} packages should specify a license. The absence of a license will cause \
             some linux distributions to complain about the quality of the application."
        );
        return Ok(());
    }
    let resources = APP_RESOURCES_LIST.fetch(params)?.unwrap_or_default();
    for license in LICENSE_FILE.fetch(params)?.unwrap_or_default() {
        if !resources.iter().any(|set| set.contains(&license)) {
            return Err(Error::config(
                "Specified license file is missing.",
                format!(
                    "Make sure that \"{license}\" references a file in the app resources, \
                     and that it is relative to the resource base directory."
                ),
            ));
        }
    }
    Ok(())
}

/// Services need a system wide install and an init script friendly name.
fn validate_service(params: &mut ParamMap) -> Result<()> {
    if !SERVICE_HINT.fetch(params)?.unwrap_or(false) {
        return Ok(());
    }
    let bundle_name = BUNDLE_NAME.require(params)?;
    if bundle_name.len() > 16 {
        return Err(Error::config(
            format!("The bundle name \"{bundle_name}\" is too long for a daemon."),
            format!(
                "Set a bundler argument \"{}\" to a bundle name that is shorter than 16 characters.",
                BUNDLE_NAME.id
            ),
        ));
    }
    // unset means system wide
    if !SYSTEM_WIDE.fetch(params)?.unwrap_or(true) {
        return Err(Error::config(
            "Bundler doesn't support per-user daemons.",
            "Make sure that the system wide hint is set to true.",
        ));
    }
    Ok(())
}

/// Each file association maps exactly one MIME type.
fn validate_file_associations(params: &mut ParamMap) -> Result<()> {
    let advice = "For Linux Bundling specify one and only one MIME type for each file association.";
    for (i, assoc) in FILE_ASSOCIATIONS
        .fetch(params)?
        .unwrap_or_default()
        .iter_mut()
        .enumerate()
    {
        let mimes = FA_CONTENT_TYPE.fetch(assoc)?.unwrap_or_default();
        match mimes.len() {
            0 => {
                return Err(Error::config(
                    format!("No MIME types were specified for File Association number {i}."),
                    advice,
                ));
            }
            1 => {}
            _ => {
                return Err(Error::config(
                    format!("More than one MIME types was specified for File Association number {i}."),
                    advice,
                ));
            }
        }
    }
    Ok(())
}

/// Debian architecture name of the host.
fn deb_arch() -> &'static str {
    match std::env::consts::ARCH {
        "x86" => "i386",
        "aarch64" => "arm64",
        "arm" => "armhf",
        "powerpc64" => "ppc64el",
        _ => "amd64",
    }
}

/// RPM architecture name of the host.
fn rpm_arch() -> &'static str {
    match std::env::consts::ARCH {
        "x86" => "i386",
        "aarch64" => "aarch64",
        "arm" => "armv7hl",
        "powerpc64" => "ppc64le",
        _ => "x86_64",
    }
}

/// Installed size in KiB of everything below `dir`.
fn installed_size_kb(dir: &std::path::Path) -> u64 {
    walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum::<u64>()
        >> 10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundle_name_derives_from_name() {
        let mut params = ParamMap::new();
        params.insert("name", "My Cool_App");
        params.insert("appVersion", "1.2");
        assert_eq!(BUNDLE_NAME.require(&mut params).unwrap(), "my-cool-app");
        assert_eq!(FULL_PACKAGE_NAME.require(&mut params).unwrap(), "my-cool-app-1.2");
    }

    #[test]
    fn maintainer_and_xdg_prefix() {
        let mut params = ParamMap::new();
        params.insert("name", "Demo");
        params.insert("vendor", "Acme Corp");
        params.insert("email", "dev@acme.test");
        assert_eq!(MAINTAINER.require(&mut params).unwrap(), "Acme Corp <dev@acme.test>");
        assert_eq!(XDG_FILE_PREFIX.require(&mut params).unwrap(), "AcmeCorp-Demo");
    }

    #[test]
    fn non_png_icon_is_dropped() {
        let mut params = ParamMap::new();
        params.insert("icon", "art/app.ico");
        assert_eq!(ICON_PNG.fetch(&mut params).unwrap(), None);

        let mut params = ParamMap::new();
        params.insert("icon", "art/app.PNG");
        assert_eq!(ICON_PNG.fetch(&mut params).unwrap(), Some(PathBuf::from("art/app.PNG")));
    }

    #[test]
    fn license_text_falls_back_to_type() {
        let mut params = ParamMap::new();
        params.insert("licenseType", "MIT");
        assert_eq!(LICENSE_TEXT.require(&mut params).unwrap(), "MIT");
    }

    #[test]
    fn service_needs_short_name_and_system_wide() {
        let mut params = ParamMap::new();
        params.insert("name", "a-very-long-service-name");
        params.insert("serviceHint", "true");
        assert!(validate_service(&mut params).unwrap_err().to_string().contains("too long"));

        let mut params = ParamMap::new();
        params.insert("name", "svc");
        params.insert("serviceHint", "true");
        params.insert("systemWide", "false");
        assert!(validate_service(&mut params).unwrap_err().is_config());
    }

    #[test]
    fn file_association_needs_one_mime() {
        let assoc: ParamMap = [("fileAssociation.contentType", "text/a text/b")]
            .into_iter()
            .collect();
        let mut params = ParamMap::new();
        params.insert("fileAssociations", vec![assoc]);
        let err = validate_file_associations(&mut params).unwrap_err();
        assert!(err.to_string().starts_with("More than one MIME types"));
    }
}
