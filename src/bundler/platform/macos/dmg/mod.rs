//! macOS disk image bundler.
//!
//! The disk image holds the `.app` bundle next to an `Applications` symlink
//! so it can be installed by drag and drop.
//!
//! - `creation` - staging and `hdiutil create`

mod creation;

use super::{
    INSTALLER_NAME, MacAppBundler, app, installer_params, predefined_image, validate_installer,
};
use crate::bundler::{
    BundleType, Bundler, Platform,
    builder::tool_detection::HAS_HDIUTIL,
    error::{Error, Result},
    params::{BundlerParam, ParamInfo, ParamMap, standard::*},
    utils::fs,
};
use async_trait::async_trait;
use std::{
    marker::PhantomData,
    path::{Path, PathBuf},
};

pub static DMG_SUFFIX: BundlerParam<String> = BundlerParam {
    id: "mac.dmg.installerName.suffix",
    name: "Installer Suffix",
    description: "Suffix appended to the installer name: <name><suffix>.dmg.",
    default: |_| Ok(Some(String::new())),
    parser: Some(|s, _| Ok(Some(s.to_string()))),
    kind: PhantomData,
};

/// Builds `.dmg` disk images.
#[derive(Debug, Clone)]
pub struct DmgBundler {
    host: Platform,
}

impl Default for DmgBundler {
    fn default() -> Self {
        Self::for_host(Platform::current())
    }
}

impl DmgBundler {
    /// A bundler that validates as if running on `host`.
    pub fn for_host(host: Platform) -> Self {
        Self { host }
    }
}

#[async_trait]
impl Bundler for DmgBundler {
    fn name(&self) -> &'static str {
        "Mac DMG Installer"
    }

    fn id(&self) -> &'static str {
        "dmg"
    }

    fn description(&self) -> &'static str {
        "Mac DMG Installer Bundle."
    }

    fn bundle_type(&self) -> BundleType {
        BundleType::Installer
    }

    fn params(&self) -> Vec<&'static dyn ParamInfo> {
        let mut params = app::app_params();
        params.extend(installer_params());
        params.push(&DMG_SUFFIX);
        params
    }

    fn validate(&self, params: &mut ParamMap) -> Result<()> {
        if predefined_image(params)?.is_some() {
            crate::bundler::image::require_host(self.host, Platform::Mac)?;
        } else {
            MacAppBundler::for_host(self.host).validate_bundle(params)?;
        }
        validate_installer(params)?;

        if !*HAS_HDIUTIL {
            return Err(Error::config(
                "Can not find hdiutil.",
                "DMG installers can only be built on macOS with hdiutil on the PATH.",
            ));
        }
        Ok(())
    }

    async fn execute(&self, params: &mut ParamMap, outdir: &Path) -> Result<PathBuf> {
        log::info!("Building DMG package for {}", APP_NAME.require(params)?);
        let bundle = match predefined_image(params)? {
            Some(image) => image,
            None => {
                let image_root = BUILD_ROOT.require(params)?.join("dmg.image");
                app::build_bundle(params, &image_root).await?
            }
        };

        fs::create_dir_all(outdir, false).await?;
        let dmg = outdir.join(format!(
            "{}{}.dmg",
            INSTALLER_NAME.require(params)?,
            DMG_SUFFIX.require(params)?
        ));
        creation::create_dmg(&bundle, &APP_FS_NAME.require(params)?, &dmg).await?;

        log::info!("✓ Created DMG: {}", dmg.display());
        Ok(dmg)
    }
}
