//! Desktop integration shared by the Linux installers: `.desktop` entries,
//! shared-mime-info XML and the maintainer script fragments registering them.

use super::{ICON_PNG, LINUX_CATEGORY, XDG_FILE_PREFIX, template};
use crate::bundler::{
    error::{ErrorExt, Result},
    params::{ParamMap, standard::*},
    utils::{fs, template as resources},
};
use serde::Serialize;
use std::{fmt::Write as _, path::Path};

/// Script fragments produced while writing the desktop files.
#[derive(Debug, Default, Serialize)]
pub(super) struct Integration {
    pub secondary_install: String,
    pub secondary_remove: String,
    pub file_association_install: String,
    pub file_association_remove: String,
    pub mime_types: String,
}

#[derive(Serialize)]
struct DesktopData {
    name: String,
    comment: String,
    fs_name: String,
    launcher: String,
    icon: bool,
    category: String,
    mime_types: String,
}

/// Writes the desktop entries and MIME info into the image root.
pub(super) async fn write_desktop_files(params: &mut ParamMap, root: &Path) -> Result<Integration> {
    let fs_name = APP_FS_NAME.require(params)?;
    let dropin = DROP_IN_RESOURCES_ROOT.fetch(params)?;
    let mut integration = Integration::default();

    for mut secondary in crate::bundler::image::secondary_launchers(params)? {
        let launcher = APP_FS_NAME.require(&mut secondary)?;
        let data = desktop_data(&mut secondary, &fs_name, String::new())?;
        let entry = resources::render(
            &format!("{launcher}.desktop"),
            "Menu shortcut descriptor",
            template::DESKTOP,
            &data,
            dropin.as_deref(),
        )?;
        fs::write_file(&root.join(format!("{launcher}.desktop")), entry).await?;

        let _ = writeln!(
            integration.secondary_install,
            "        xdg-desktop-menu install --novendor /opt/{fs_name}/{launcher}.desktop"
        );
        let _ = writeln!(
            integration.secondary_remove,
            "        xdg-desktop-menu uninstall --novendor /opt/{fs_name}/{launcher}.desktop"
        );
    }

    write_mime_info(params, root, &fs_name, &mut integration).await?;

    let data = desktop_data(params, &fs_name, integration.mime_types.clone())?;
    let entry = resources::render(
        &format!("{fs_name}.desktop"),
        "Menu shortcut descriptor",
        template::DESKTOP,
        &data,
        dropin.as_deref(),
    )?;
    fs::write_file(&root.join(format!("{fs_name}.desktop")), entry).await?;

    Ok(integration)
}

fn desktop_data(params: &mut ParamMap, fs_name: &str, mime_types: String) -> Result<DesktopData> {
    Ok(DesktopData {
        name: APP_NAME.require(params)?,
        comment: DESCRIPTION.require(params)?,
        fs_name: fs_name.to_string(),
        launcher: APP_FS_NAME.require(params)?,
        icon: ICON_PNG.fetch(params)?.is_some(),
        category: LINUX_CATEGORY.require(params)?,
        mime_types,
    })
}

async fn write_mime_info(
    params: &mut ParamMap,
    root: &Path,
    fs_name: &str,
    integration: &mut Integration,
) -> Result<()> {
    let associations = FILE_ASSOCIATIONS.fetch(params)?.unwrap_or_default();
    if associations.is_empty() {
        return Ok(());
    }

    let mime_file = format!("{}-MimeInfo.xml", XDG_FILE_PREFIX.require(params)?);
    let mut xml = String::from(
        "<?xml version=\"1.0\"?>\n<mime-info xmlns='http://www.freedesktop.org/standards/shared-mime-info'>\n",
    );
    let mut mimes = Vec::new();

    for entry in associations {
        // association keys fall back to the application's own values
        let mut assoc = params.clone();
        assoc.extend(&entry);
        let Some(mime) = FA_CONTENT_TYPE
            .fetch(&mut assoc)?
            .and_then(|m| m.into_iter().next())
        else {
            continue;
        };
        let _ = writeln!(xml, "  <mime-type type='{mime}'>");
        let description = FA_DESCRIPTION.fetch(&mut assoc)?.unwrap_or_default();
        if !description.is_empty() {
            let _ = writeln!(xml, "    <comment>{description}</comment>");
        }
        for ext in FA_EXTENSIONS.fetch(&mut assoc)?.unwrap_or_default() {
            let _ = writeln!(xml, "    <glob pattern='*.{ext}'/>");
        }
        xml.push_str("  </mime-type>\n");

        if let Some(icon) = FA_ICON.fetch(&mut assoc)? {
            if let Some(size) = square_png_size(&icon) {
                let file_name = icon
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let target = format!("{fs_name}_fa_{file_name}");
                fs::copy_file(&icon, &root.join(&target)).await?;
                let dash_mime = mime.replace('/', "-");
                let _ = writeln!(
                    integration.file_association_install,
                    "        xdg-icon-resource install --context mimetypes --size {size} /opt/{fs_name}/{target} {dash_mime}"
                );
                let _ = writeln!(
                    integration.file_association_remove,
                    "        xdg-icon-resource uninstall --context mimetypes --size {size} /opt/{fs_name}/{target} {dash_mime}"
                );
            }
        }
        mimes.push(mime);
    }
    xml.push_str("</mime-info>");

    if mimes.is_empty() {
        return Ok(());
    }
    fs::write_file(&root.join(&mime_file), xml).await?;
    integration.file_association_install.insert_str(
        0,
        &format!("        xdg-mime install /opt/{fs_name}/{mime_file}\n"),
    );
    integration.file_association_remove.insert_str(
        0,
        &format!("        xdg-mime uninstall /opt/{fs_name}/{mime_file}\n"),
    );
    integration.mime_types = mimes.join(";");
    Ok(())
}

/// Edge length of a square PNG, read from its IHDR chunk.
fn square_png_size(path: &Path) -> Option<u32> {
    let bytes = std::fs::read(path)
        .fs_context("reading icon", path)
        .map_err(|e| log::debug!("{e}"))
        .ok()?;
    if bytes.len() < 24 || &bytes[..8] != b"\x89PNG\r\n\x1a\n" || &bytes[12..16] != b"IHDR" {
        return None;
    }
    let width = u32::from_be_bytes(bytes[16..20].try_into().ok()?);
    let height = u32::from_be_bytes(bytes[20..24].try_into().ok()?);
    (width == height && width > 0).then_some(width)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(size: u32) -> Vec<u8> {
        let mut bytes = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR".to_vec();
        bytes.extend_from_slice(&size.to_be_bytes());
        bytes.extend_from_slice(&size.to_be_bytes());
        bytes
    }

    #[test]
    fn png_size_requires_square() {
        let dir = tempfile::tempdir().unwrap();
        let square = dir.path().join("a.png");
        std::fs::write(&square, png(48)).unwrap();
        assert_eq!(square_png_size(&square), Some(48));

        let text = dir.path().join("b.png");
        std::fs::write(&text, b"not a png at all, clearly").unwrap();
        assert_eq!(square_png_size(&text), None);
    }

    #[tokio::test]
    async fn desktop_entry_and_mime_info() {
        let dir = tempfile::tempdir().unwrap();
        let icon = dir.path().join("doc.png");
        std::fs::write(&icon, png(32)).unwrap();

        let mut assoc: ParamMap = [
            ("fileAssociation.contentType", "application/x-demo"),
            ("fileAssociation.extension", "demo dmo"),
        ]
        .into_iter()
        .collect();
        assoc.insert("fileAssociation.icon", icon);

        let mut params = ParamMap::new();
        params.insert("name", "Demo");
        params.insert("vendor", "Acme");
        params.insert("fileAssociations", vec![assoc]);
        params.insert_null("dropinResourcesRoot");

        let integration = write_desktop_files(&mut params, dir.path()).await.unwrap();
        assert_eq!(integration.mime_types, "application/x-demo");
        assert!(integration
            .file_association_install
            .starts_with("        xdg-mime install /opt/Demo/Acme-Demo-MimeInfo.xml\n"));
        assert!(integration
            .file_association_install
            .contains("--size 32 /opt/Demo/Demo_fa_doc.png application-x-demo"));

        let xml = std::fs::read_to_string(dir.path().join("Acme-Demo-MimeInfo.xml")).unwrap();
        assert!(xml.contains("<glob pattern='*.dmo'/>"));
        assert!(xml.contains("<comment>Demo File</comment>"));

        let desktop = std::fs::read_to_string(dir.path().join("Demo.desktop")).unwrap();
        assert!(desktop.contains("Exec=/opt/Demo/Demo\n"));
        assert!(desktop.contains("Categories=Utility\n"));
        assert!(desktop.contains("MimeType=application/x-demo\n"));
        assert!(!desktop.contains("Icon="));
    }
}
