//! Inno Setup project generation.
//!
//! Values that end up on `Key=Value` lines go through
//! [`utils::innosetup_escape`]; entries of the `[Icons]`, `[Registry]` and
//! `[Run]` sections are built here with every parameter quoted.

use super::{
    EXE_SYSTEM_WIDE, INSTALLER_FILE_NAME, MENU_GROUP, REGISTRY_NAME, template::ISS_TEMPLATE, utils,
};
use crate::bundler::{
    Platform,
    error::Result,
    image::{self, launcher::launcher_name},
    params::{ParamMap, standard::*},
    utils::template,
};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct IssData {
    app_id: String,
    name: String,
    version: String,
    vendor: String,
    comments: String,
    copyright: String,
    version_info: String,
    description: String,
    install_dir: String,
    disable_dir_page: &'static str,
    group: String,
    license_file: Option<String>,
    installer_name: String,
    privileges: &'static str,
    setup_icon: Option<String>,
    uninstall_icon: String,
    wizard_image: Option<String>,
    arch_mode: &'static str,
    registry: Vec<String>,
    source: String,
    icons: Vec<String>,
    run_file: String,
    run_description: String,
    app_cds_install: bool,
}

/// Renders `<name.fs>.iss` for the image staged in `image_dir`.
///
/// # Arguments
///
/// * `params` - installer parameters
/// * `image_dir` - directory holding the image root and the project file
/// * `license_file` - license file name, already copied next to the project
/// * `wizard_image` - setup dialog bitmap name, already copied next to the project
pub fn render_iss(
    params: &mut ParamMap,
    image_dir: &Path,
    license_file: Option<String>,
    wizard_image: Option<String>,
) -> Result<String> {
    let fs_name = APP_FS_NAME.require(params)?;
    let name = APP_NAME.require(params)?;
    let version = VERSION.require(params)?;
    let system_wide = EXE_SYSTEM_WIDE.require(params)?;
    let launcher = launcher_name(&fs_name, Platform::Windows, LAUNCHER.fetch(params)?.is_some());
    let icon_name = format!("{fs_name}.ico");
    let has_icon = image_dir.join(&fs_name).join(&icon_name).is_file();

    let data = IssData {
        app_id: utils::innosetup_escape(&utils::app_identifier(&IDENTIFIER.require(params)?)),
        name: utils::innosetup_escape(&name),
        version: utils::innosetup_escape(&version),
        vendor: utils::innosetup_escape(&VENDOR.require(params)?),
        comments: utils::innosetup_escape(&TITLE.require(params)?),
        copyright: utils::innosetup_escape(&COPYRIGHT.require(params)?),
        version_info: utils::format_version_info(&version),
        description: utils::innosetup_escape(&DESCRIPTION.require(params)?),
        install_dir: utils::innosetup_escape(&format!(
            "{}\\{fs_name}",
            if system_wide { "{pf}" } else { "{localappdata}" }
        )),
        disable_dir_page: if INSTALLDIR_CHOOSER.require(params)? {
            "No"
        } else {
            "Yes"
        },
        group: utils::innosetup_escape(&MENU_GROUP.require(params)?),
        license_file: license_file.map(|l| utils::innosetup_escape(&l)),
        installer_name: utils::innosetup_escape(&INSTALLER_FILE_NAME.require(params)?),
        privileges: if system_wide { "admin" } else { "lowest" },
        setup_icon: has_icon.then(|| utils::innosetup_escape(&format!("{fs_name}\\{icon_name}"))),
        uninstall_icon: utils::innosetup_escape(&format!("{{app}}\\{icon_name}")),
        wizard_image: wizard_image.map(|w| utils::innosetup_escape(&w)),
        arch_mode: utils::map_arch(std::env::consts::ARCH)?,
        registry: registry_entries(params, &launcher, system_wide)?,
        source: utils::quoted(&format!("{fs_name}\\*")),
        icons: icon_entries(params, system_wide)?,
        run_file: utils::quoted(&format!("{{app}}\\{launcher}")),
        run_description: utils::quoted(&format!("{{cm:LaunchProgram,{name}}}")),
        app_cds_install: app_cds_cache_on_install(params)?,
    };

    let dropin = DROP_IN_RESOURCES_ROOT.fetch(params)?;
    template::render(
        &format!("{fs_name}.iss"),
        "Inno Setup project file",
        ISS_TEMPLATE,
        &data,
        dropin.as_deref(),
    )
}

/// `[Icons]` entries for the main and secondary launchers.
fn icon_entries(params: &mut ParamMap, system_wide: bool) -> Result<Vec<String>> {
    let desktop = if system_wide {
        "{commondesktop}"
    } else {
        "{userdesktop}"
    };
    let mut launchers = vec![params.clone()];
    launchers.extend(image::secondary_launchers(params)?);

    let mut entries = Vec::new();
    for mut launcher in launchers {
        let name = APP_NAME.require(&mut launcher)?;
        let fs_name = APP_FS_NAME.require(&mut launcher)?;
        let file = launcher_name(&fs_name, Platform::Windows, LAUNCHER.fetch(&mut launcher)?.is_some());
        let target = format!(
            "Filename: {}; IconFilename: {}",
            utils::quoted(&format!("{{app}}\\{file}")),
            utils::quoted(&format!("{{app}}\\{fs_name}.ico")),
        );
        if MENU_HINT.fetch(&mut launcher)?.unwrap_or(true) {
            entries.push(format!(
                "Name: {}; {target}",
                utils::quoted(&format!("{{group}}\\{name}"))
            ));
        }
        if SHORTCUT_HINT.fetch(&mut launcher)?.unwrap_or(false) {
            entries.push(format!(
                "Name: {}; {target}",
                utils::quoted(&format!("{desktop}\\{name}"))
            ));
        }
    }
    Ok(entries)
}

/// `[Registry]` entries registering every file association.
fn registry_entries(
    params: &mut ParamMap,
    launcher: &str,
    system_wide: bool,
) -> Result<Vec<String>> {
    let (root, classes) = if system_wide {
        ("HKCR", "")
    } else {
        ("HKCU", "Software\\Classes\\")
    };
    let registry_name = REGISTRY_NAME.require(params)?;

    let mut entries = Vec::new();
    for (i, entry) in FILE_ASSOCIATIONS
        .fetch(params)?
        .unwrap_or_default()
        .iter()
        .enumerate()
    {
        let mut assoc = params.clone();
        assoc.extend(entry);
        let class = if i == 0 {
            format!("{registry_name}File")
        } else {
            format!("{registry_name}File.{i}")
        };
        let key = |subkey: &str| utils::quoted(&format!("{classes}{subkey}"));

        let extensions = FA_EXTENSIONS.fetch(&mut assoc)?.unwrap_or_default();
        if extensions.is_empty() {
            log::info!("Creating association with null extension.");
        }
        for ext in &extensions {
            entries.push(format!(
                "Root: {root}; Subkey: {}; ValueType: string; ValueName: \"\"; ValueData: {}; Flags: uninsdeletevalue",
                key(&format!(".{ext}")),
                utils::quoted(&class),
            ));
        }
        if let Some(ext) = extensions.first() {
            for mime in FA_CONTENT_TYPE.fetch(&mut assoc)?.unwrap_or_default() {
                entries.push(format!(
                    "Root: {root}; Subkey: {}; ValueType: string; ValueName: \"Extension\"; ValueData: {}; Flags: uninsdeletevalue",
                    key(&format!("Mime\\Database\\Content Type\\{mime}")),
                    utils::quoted(&format!(".{ext}")),
                ));
            }
        }

        entries.push(format!(
            "Root: {root}; Subkey: {}; ValueType: string; ValueName: \"\"; ValueData: {}; Flags: uninsdeletekey",
            key(&class),
            utils::quoted(&FA_DESCRIPTION.require(&mut assoc)?),
        ));
        let icon = FA_ICON
            .fetch(&mut assoc)?
            .filter(|i| i.is_file())
            .and_then(|i| i.file_name().map(|n| n.to_string_lossy().into_owned()));
        if let Some(icon) = icon {
            entries.push(format!(
                "Root: {root}; Subkey: {}; ValueType: string; ValueName: \"\"; ValueData: {}",
                key(&format!("{class}\\DefaultIcon")),
                utils::quoted(&format!("{{app}}\\{icon}")),
            ));
        }
        entries.push(format!(
            "Root: {root}; Subkey: {}; ValueType: string; ValueName: \"\"; ValueData: {}",
            key(&format!("{class}\\shell\\open\\command")),
            utils::quoted(&format!("\"{{app}}\\{launcher}\" \"%1\"")),
        ));
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ParamMap {
        let mut params = ParamMap::new();
        params.insert("name", "Hello");
        params.insert("vendor", "Acme");
        params.insert("identifier", "com.example.hello");
        params.insert("appVersion", "1.2");
        params.insert_null("dropinResourcesRoot");
        params
    }

    #[test]
    fn per_user_install_by_default() {
        let image = tempfile::tempdir().unwrap();
        let mut params = params();
        let iss = render_iss(&mut params, image.path(), None, None).unwrap();
        assert!(iss.contains("AppId=com.example.hello\n"));
        assert!(iss.contains("DefaultDirName={localappdata}\\Hello\n"));
        assert!(iss.contains("PrivilegesRequired=lowest\n"));
        assert!(iss.contains("VersionInfoVersion=1.2.0.0\n"));
        assert!(iss.contains("DisableDirPage=Yes\n"));
        assert!(iss.contains("Source: \"Hello\\*\"; DestDir: \"{app}\""));
        assert!(iss.contains("Name: \"{group}\\Hello\"; Filename: \"{app}\\Hello.cmd\""));
        assert!(!iss.contains("LicenseFile="));
        assert!(!iss.contains("[Registry]"));
    }

    #[test]
    fn system_wide_associations_use_hkcr() {
        let image = tempfile::tempdir().unwrap();
        let mut params = params();
        params.insert("systemWide", "true");
        let assoc: ParamMap = [
            ("fileAssociation.extension", "hlo"),
            ("fileAssociation.contentType", "application/x-hello"),
        ]
        .into_iter()
        .collect();
        params.insert("fileAssociations", vec![assoc]);

        let iss = render_iss(&mut params, image.path(), Some("LICENSE.txt".into()), None).unwrap();
        assert!(iss.contains("PrivilegesRequired=admin\n"));
        assert!(iss.contains("LicenseFile=LICENSE.txt\n"));
        assert!(iss.contains("ChangesAssociations=yes"));
        assert!(iss.contains(
            "Root: HKCR; Subkey: \".hlo\"; ValueType: string; ValueName: \"\"; ValueData: \"HelloFile\"; Flags: uninsdeletevalue"
        ));
        assert!(iss.contains("Subkey: \"Mime\\Database\\Content Type\\application/x-hello\""));
        assert!(iss.contains("ValueData: \"Hello File\"; Flags: uninsdeletekey"));
    }

    #[test]
    fn desktop_shortcuts_for_secondary_launchers() {
        let image = tempfile::tempdir().unwrap();
        let mut params = params();
        let extra: ParamMap = [("name", "Hello Tool"), ("shortcutHint", "true")]
            .into_iter()
            .collect();
        params.insert("secondaryLaunchers", vec![extra]);

        let iss = render_iss(&mut params, image.path(), None, None).unwrap();
        assert!(iss.contains("Name: \"{group}\\Hello Tool\"; Filename: \"{app}\\HelloTool.cmd\""));
        assert!(iss.contains("Name: \"{userdesktop}\\Hello Tool\""));
        assert!(!iss.contains("Name: \"{userdesktop}\\Hello\";"));
    }

    #[test]
    fn app_cds_install_cache_runs_after_setup() {
        let image = tempfile::tempdir().unwrap();
        let mut params = params();
        let iss = render_iss(&mut params, image.path(), None, None).unwrap();
        assert!(!iss.contains("generatecache"));

        params.insert("commercial.AppCDS", "true");
        params.insert("commercial.AppCDS.cache", "auto+install");
        let iss = render_iss(&mut params, image.path(), None, None).unwrap();
        assert!(iss.contains(
            "Filename: \"{app}\\Hello.cmd\"; Parameters: \"-Xappcds:generatecache\"; Flags: runhidden waituntilterminated\n"
        ));
    }
}
