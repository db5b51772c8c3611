//! macOS bundlers: `.app` bundle, disk image and flat installer package.
//!
//! The installers wrap the `.app` built by [`MacAppBundler`], or an existing
//! bundle passed as `mac.app.image`.

mod app;
mod dmg;
mod pkg;

pub use app::MacAppBundler;
pub use dmg::DmgBundler;
pub use pkg::PkgBundler;

use crate::bundler::{
    builder::signing::{DEVELOPER_ID_APP_PREFIX, DEVELOPER_ID_INSTALLER_PREFIX, find_signing_key},
    error::{Error, Result},
    params::{BundlerParam, ParamInfo, ParamMap, no_default, standard::*},
};
use std::{marker::PhantomData, path::PathBuf};

/// Display names of the App Store categories and their `LSApplicationCategoryType` ids.
const CATEGORIES: &[(&str, &str)] = &[
    ("Business", "public.app-category.business"),
    ("Developer Tools", "public.app-category.developer-tools"),
    ("Education", "public.app-category.education"),
    ("Entertainment", "public.app-category.entertainment"),
    ("Finance", "public.app-category.finance"),
    ("Games", "public.app-category.games"),
    ("Graphics & Design", "public.app-category.graphics-design"),
    ("Healthcare & Fitness", "public.app-category.healthcare-fitness"),
    ("Lifestyle", "public.app-category.lifestyle"),
    ("Medical", "public.app-category.medical"),
    ("Music", "public.app-category.music"),
    ("News", "public.app-category.news"),
    ("Photography", "public.app-category.photography"),
    ("Productivity", "public.app-category.productivity"),
    ("Reference", "public.app-category.reference"),
    ("Social Networking", "public.app-category.social-networking"),
    ("Sports", "public.app-category.sports"),
    ("Travel", "public.app-category.travel"),
    ("Utilities", "public.app-category.utilities"),
    ("Video", "public.app-category.video"),
    ("Weather", "public.app-category.weather"),
    ("Action Games", "public.app-category.action-games"),
    ("Adventure Games", "public.app-category.adventure-games"),
    ("Arcade Games", "public.app-category.arcade-games"),
    ("Board Games", "public.app-category.board-games"),
    ("Card Games", "public.app-category.card-games"),
    ("Casino Games", "public.app-category.casino-games"),
    ("Dice Games", "public.app-category.dice-games"),
    ("Educational Games", "public.app-category.educational-games"),
    ("Family Games", "public.app-category.family-games"),
    ("Kids Games", "public.app-category.kids-games"),
    ("Music Games", "public.app-category.music-games"),
    ("Puzzle Games", "public.app-category.puzzle-games"),
    ("Racing Games", "public.app-category.racing-games"),
    ("Role Playing Games", "public.app-category.role-playing-games"),
    ("Simulation Games", "public.app-category.simulation-games"),
    ("Sports Games", "public.app-category.sports-games"),
    ("Strategy Games", "public.app-category.strategy-games"),
    ("Trivia Games", "public.app-category.trivia-games"),
    ("Word Games", "public.app-category.word-games"),
];

pub static MAC_CF_BUNDLE_NAME: BundlerParam<String> = BundlerParam {
    id: "mac.CFBundleName",
    name: "CFBundleName",
    description: "The name of the app as it appears in the Menu Bar. Should be less than 16 characters long.",
    default: |p| {
        let name = APP_NAME.require(p)?;
        if name.chars().count() > 16 {
            log::info!(
                "mac.CFBundleName is set to '{name}', which is longer than 16 characters. \
                 For a better Mac experience consider shortening it."
            );
        }
        Ok(Some(name))
    },
    parser: Some(|s, _| Ok(Some(s.to_string()))),
    kind: PhantomData,
};

pub static MAC_CF_BUNDLE_IDENTIFIER: BundlerParam<String> = BundlerParam {
    id: "mac.CFBundleIdentifier",
    name: "CFBundleIdentifier",
    description: "Reverse DNS identifier of the application. May only use letters, digits, hyphens and periods.",
    default: |p| IDENTIFIER.fetch(p),
    parser: Some(|s, _| Ok(Some(s.to_string()))),
    kind: PhantomData,
};

pub static MAC_CF_BUNDLE_VERSION: BundlerParam<String> = BundlerParam {
    id: "mac.CFBundleVersion",
    name: "CFBundleVersion",
    description: "Machine readable bundle version: one to three integers separated by dots, such as 1.8.1 or 100.",
    default: |p| {
        let version = VERSION.require(p)?;
        Ok(Some(if valid_bundle_version(&version) {
            version
        } else {
            "100".to_string()
        }))
    },
    parser: Some(|s, _| Ok(Some(s.to_string()))),
    kind: PhantomData,
};

pub static MAC_CATEGORY: BundlerParam<String> = BundlerParam {
    id: "mac.category",
    name: "Category",
    description: "App Store category, either a display name such as \"Developer Tools\" or its public.app-category id.",
    default: |p| Ok(Some(category_id(&CATEGORY.require(p)?))),
    parser: Some(|s, _| Ok(Some(category_id(s)))),
    kind: PhantomData,
};

pub static ICON_ICNS: BundlerParam<PathBuf> = BundlerParam {
    id: "icon.icns",
    name: ".icns Icon",
    description: "Icon for the application, in ICNS format.",
    default: |p| {
        Ok(ICON.fetch(p)?.filter(|icon| {
            let icns = icon
                .extension()
                .is_some_and(|e| e.eq_ignore_ascii_case("icns"));
            if !icns {
                log::warn!(
                    "The specified icon \"{}\" is not an ICNS file and will not be used.",
                    icon.display()
                );
            }
            icns
        }))
    },
    parser: Some(|s, _| Ok(Some(PathBuf::from(s)))),
    kind: PhantomData,
};

pub static SIGNING_KEY_USER: BundlerParam<String> = BundlerParam {
    id: "mac.signing-key-user-name",
    name: "Signing Key User Name",
    description: "The user name portion of the \"Developer ID Application: <user name>\" signing key.",
    default: |_| Ok(Some(String::new())),
    parser: Some(|s, _| Ok(Some(s.to_string()))),
    kind: PhantomData,
};

pub static SIGNING_KEYCHAIN: BundlerParam<String> = BundlerParam {
    id: "mac.signing-keychain",
    name: "Signing Keychain",
    description: "Keychain to search for signing keys. Unset searches the standard keychains.",
    default: no_default,
    parser: Some(|s, _| Ok(Some(s.to_string()))),
    kind: PhantomData,
};

pub static DEVELOPER_ID_APP_SIGNING_KEY: BundlerParam<String> = BundlerParam {
    id: "mac.signing-key-developer-id-app",
    name: "Apple Developer ID Application Signing Key",
    description: "The full name of the Apple Developer ID Application signing key.",
    default: |p| signing_key(p, DEVELOPER_ID_APP_PREFIX),
    parser: Some(|s, _| Ok(Some(s.to_string()))),
    kind: PhantomData,
};

pub static DEVELOPER_ID_INSTALLER_SIGNING_KEY: BundlerParam<String> = BundlerParam {
    id: "mac.signing-key-developer-id-installer",
    name: "Apple Developer ID Installer Signing Key",
    description: "The full name of the Apple Developer ID Installer signing key.",
    default: |p| signing_key(p, DEVELOPER_ID_INSTALLER_PREFIX),
    parser: Some(|s, _| Ok(Some(s.to_string()))),
    kind: PhantomData,
};

pub static MAC_APP_IMAGE: BundlerParam<PathBuf> = BundlerParam {
    id: "mac.app.image",
    name: "Image Directory",
    description: "Existing .app bundle used to build the DMG or PKG installer instead of a fresh image.",
    default: no_default,
    parser: Some(|s, _| Ok(Some(PathBuf::from(s)))),
    kind: PhantomData,
};

pub static INSTALLER_NAME: BundlerParam<String> = BundlerParam {
    id: "mac.installerName",
    name: "Installer Name",
    description: "File name of the installer without suffix and extension. Defaults to <name.fs>-<version>.",
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

/// Whether `version` is usable as `CFBundleVersion`: one to three
/// non-negative integers, the first at least 1.
pub fn valid_bundle_version(version: &str) -> bool {
    let parts: Vec<&str> = version.split('.').collect();
    if parts.is_empty() || parts.len() > 3 {
        log::debug!("Version string may have between 1 and 3 numbers: 1, 1.2, 1.2.3.");
        return false;
    }
    if parts
        .iter()
        .any(|p| p.is_empty() || !p.chars().all(|c| c.is_ascii_digit()))
    {
        log::debug!("Version strings can consist of only numbers and up to two dots.");
        return false;
    }
    // leading zeros are ignored
    if parts[0].trim_start_matches('0').is_empty() {
        log::debug!("The first number in a CFBundleVersion cannot be zero or negative.");
        return false;
    }
    true
}

/// Maps a category display name to its id; ids and unknown names pass through.
fn category_id(category: &str) -> String {
    CATEGORIES
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, id)| id.to_string())
        .unwrap_or_else(|| category.to_string())
}

fn signing_key(params: &mut ParamMap, prefix: &str) -> Result<Option<String>> {
    let user = SIGNING_KEY_USER.require(params)?;
    let keychain = SIGNING_KEYCHAIN.fetch(params)?;
    Ok(find_signing_key(&format!("{prefix}{user}"), keychain.as_deref()))
}

/// Checks the bundle identifier is a reverse DNS name whose segments start with a letter.
fn validate_bundle_identifier(params: &mut ParamMap) -> Result<()> {
    let identifier = MAC_CF_BUNDLE_IDENTIFIER.require(params)?;
    let re = regex::Regex::new(r"^[A-Za-z][A-Za-z0-9-]*(\.[A-Za-z][A-Za-z0-9-]*)*$")
        .map_err(|e| Error::GenericError(e.to_string()))?;
    if re.is_match(&identifier) {
        Ok(())
    } else {
        Err(Error::config(
            format!("Invalid value \"{identifier}\" for the bundle identifier."),
            format!(
                "Set \"{}\" to a reverse DNS name such as com.example.app. Each segment must \
                 start with a letter and may only contain letters, digits and hyphens.",
                MAC_CF_BUNDLE_IDENTIFIER.id
            ),
        ))
    }
}

/// Checks shared by the installers: services and license files.
fn validate_installer(params: &mut ParamMap) -> Result<()> {
    if SERVICE_HINT.fetch(params)?.unwrap_or(false) {
        return Err(Error::config(
            "Services are not supported by the macOS installers.",
            "Unset \"serviceHint\" or set it to false.",
        ));
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

/// An existing `mac.app.image` must be a directory.
fn predefined_image(params: &mut ParamMap) -> Result<Option<PathBuf>> {
    match MAC_APP_IMAGE.fetch(params)? {
        Some(image) if image.is_dir() => Ok(Some(image)),
        Some(image) => Err(Error::config(
            format!("The supplied app image \"{}\" does not exist.", image.display()),
            format!("Point \"{}\" at an existing .app bundle.", MAC_APP_IMAGE.id),
        )),
        None => Ok(None),
    }
}

/// Parameters the installers read on top of the `.app` parameters.
fn installer_params() -> Vec<&'static dyn ParamInfo> {
    vec![
        &MAC_APP_IMAGE,
        &INSTALLER_NAME,
        &LICENSE_FILE,
        &SERVICE_HINT,
        &SIGN_BUNDLE,
        &SIGNING_KEYCHAIN,
        &SIGNING_KEY_USER,
        &VERBOSE,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundle_versions() {
        assert!(valid_bundle_version("1"));
        assert!(valid_bundle_version("1.8.1"));
        assert!(valid_bundle_version("10.02"));
        assert!(!valid_bundle_version("0.9"));
        assert!(!valid_bundle_version("1.2.3.4"));
        assert!(!valid_bundle_version("1.0-beta"));
        assert!(!valid_bundle_version(""));
    }

    #[test]
    fn invalid_version_falls_back_to_100() {
        let mut params = ParamMap::new();
        params.insert("appVersion", "0.1");
        assert_eq!(MAC_CF_BUNDLE_VERSION.require(&mut params).unwrap(), "100");

        let mut params = ParamMap::new();
        params.insert("appVersion", "2.4");
        assert_eq!(MAC_CF_BUNDLE_VERSION.require(&mut params).unwrap(), "2.4");
    }

    #[test]
    fn categories_map_to_ids() {
        let mut params = ParamMap::new();
        params.insert("applicationCategory", "Developer Tools");
        assert_eq!(
            MAC_CATEGORY.require(&mut params).unwrap(),
            "public.app-category.developer-tools"
        );

        let mut params = ParamMap::new();
        params.insert("mac.category", "public.app-category.games");
        assert_eq!(MAC_CATEGORY.require(&mut params).unwrap(), "public.app-category.games");
    }

    #[test]
    fn identifier_segments_start_with_letter() {
        let mut params = ParamMap::new();
        params.insert("mac.CFBundleIdentifier", "com.example.hello-app");
        validate_bundle_identifier(&mut params).unwrap();

        let mut params = ParamMap::new();
        params.insert("mac.CFBundleIdentifier", "com.3d.viewer");
        let err = validate_bundle_identifier(&mut params).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid value \"com.3d.viewer\" for the bundle identifier."
        );
    }

    #[test]
    fn installer_name_defaults() {
        let mut params = ParamMap::new();
        params.insert("name", "Hello App");
        params.insert("appVersion", "3.1");
        assert_eq!(INSTALLER_NAME.require(&mut params).unwrap(), "HelloApp-3.1");
    }
}
