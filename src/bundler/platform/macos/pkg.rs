//! macOS flat installer package.
//!
//! `pkgbuild` wraps the `.app` in a component package installed to
//! `/Applications`; `productbuild` combines it with a distribution file into
//! the product archive, signing it when an installer key is known.

use super::{
    DEVELOPER_ID_INSTALLER_SIGNING_KEY, INSTALLER_NAME, MAC_CF_BUNDLE_IDENTIFIER, MacAppBundler,
    SIGNING_KEYCHAIN, app, installer_params, predefined_image, validate_installer,
};
use crate::bundler::{
    BundleType, Bundler, Platform,
    builder::tool_detection::HAS_PKGBUILD,
    error::{Error, ErrorExt, Result},
    image,
    params::{BundlerParam, ParamInfo, ParamMap, standard::*},
    utils::{fs, process, template},
};
use async_trait::async_trait;
use path_absolutize::Absolutize;
use serde::Serialize;
use std::{
    marker::PhantomData,
    path::{Path, PathBuf},
};

const DISTRIBUTION: &str = r#"<?xml version="1.0" encoding="utf-8" standalone="no"?>
<installer-gui-script minSpecVersion="1">
<title>{{title}}</title>
{{#if license}}<license file="{{license}}" mime-type="text/rtf"/>
{{/if}}<pkg-ref id="{{id}}"/>
<options customize="never" require-scripts="false"/>
<choices-outline>
    <line choice="default">
        <line choice="{{id}}"/>
    </line>
</choices-outline>
<choice id="default"/>
<choice id="{{id}}" visible="false">
    <pkg-ref id="{{id}}"/>
</choice>
<pkg-ref id="{{id}}" version="{{version}}" onConclusion="none">{{package}}</pkg-ref>
</installer-gui-script>
"#;

pub static PKG_SUFFIX: BundlerParam<String> = BundlerParam {
    id: "mac.pkg.installerName.suffix",
    name: "Installer Suffix",
    description: "Suffix appended to the installer name: <name><suffix>.pkg.",
    default: |_| Ok(Some(String::new())),
    parser: Some(|s, _| Ok(Some(s.to_string()))),
    kind: PhantomData,
};

#[derive(Serialize)]
struct DistributionData {
    title: String,
    license: Option<String>,
    id: String,
    version: String,
    package: String,
}

/// Builds `.pkg` installers.
#[derive(Debug, Clone)]
pub struct PkgBundler {
    host: Platform,
}

impl Default for PkgBundler {
    fn default() -> Self {
        Self::for_host(Platform::current())
    }
}

impl PkgBundler {
    /// A bundler that validates as if running on `host`.
    pub fn for_host(host: Platform) -> Self {
        Self { host }
    }
}

#[async_trait]
impl Bundler for PkgBundler {
    fn name(&self) -> &'static str {
        "Mac PKG Installer"
    }

    fn id(&self) -> &'static str {
        "pkg"
    }

    fn description(&self) -> &'static str {
        "Mac PKG Installer Bundle."
    }

    fn bundle_type(&self) -> BundleType {
        BundleType::Installer
    }

    fn params(&self) -> Vec<&'static dyn ParamInfo> {
        let mut params = app::app_params();
        params.extend(installer_params());
        params.push(&DEVELOPER_ID_INSTALLER_SIGNING_KEY);
        params.push(&PKG_SUFFIX);
        params
    }

    fn validate(&self, params: &mut ParamMap) -> Result<()> {
        if predefined_image(params)?.is_some() {
            image::require_host(self.host, Platform::Mac)?;
        } else {
            MacAppBundler::for_host(self.host).validate_bundle(params)?;
        }
        validate_installer(params)?;

        if SIGN_BUNDLE.fetch(params)?.unwrap_or(false)
            && DEVELOPER_ID_INSTALLER_SIGNING_KEY.fetch(params)?.is_none()
        {
            return Err(Error::config(
                "Signature explicitly requested but no signing certificate specified.",
                "Either specify a valid cert in 'mac.signing-key-developer-id-installer' or unset \
                 'signBundle' or set 'signBundle' to false.",
            ));
        }

        if !*HAS_PKGBUILD {
            return Err(Error::config(
                "Can not find pkgbuild.",
                "PKG installers can only be built on macOS with pkgbuild and productbuild on the PATH.",
            ));
        }
        Ok(())
    }

    async fn execute(&self, params: &mut ParamMap, outdir: &Path) -> Result<PathBuf> {
        log::info!("Building PKG package for {}", APP_NAME.require(params)?);
        let build_root = BUILD_ROOT.require(params)?;
        let bundle = match predefined_image(params)? {
            Some(image) => image,
            None => app::build_bundle(params, &build_root.join("pkg.image")).await?,
        };

        let config_root = build_root.join("macosx");
        let packages = build_root.join("packages");
        fs::create_dir_all(&config_root, true).await?;
        fs::create_dir_all(&packages, true).await?;

        let app_pkg = packages.join(format!("{}-app.pkg", APP_FS_NAME.require(params)?));
        let mut command = tokio::process::Command::new("pkgbuild");
        command
            .arg("--component")
            .arg(&bundle)
            .args(["--install-location", "/Applications"])
            .arg(&app_pkg);
        process::run(&mut command).await?;

        let distribution = config_root.join("distribution.dist");
        fs::write_file(&distribution, render_distribution(params, &app_pkg)?).await?;

        fs::create_dir_all(outdir, false).await?;
        let pkg = outdir
            .join(format!(
                "{}{}.pkg",
                INSTALLER_NAME.require(params)?,
                PKG_SUFFIX.require(params)?
            ))
            .absolutize()
            .fs_context("resolving output path", outdir)?
            .into_owned();

        let mut command = tokio::process::Command::new("productbuild");
        command.arg("--resources").arg(&config_root);
        if SIGN_BUNDLE.fetch(params)?.unwrap_or(true) {
            if let Some(identity) = DEVELOPER_ID_INSTALLER_SIGNING_KEY.fetch(params)? {
                command.args(["--sign", identity.as_str()]);
            }
            if let Some(keychain) = SIGNING_KEYCHAIN.fetch(params)?.filter(|k| !k.is_empty()) {
                command.args(["--keychain", keychain.as_str()]);
            }
        }
        command
            .arg("--distribution")
            .arg(&distribution)
            .arg("--package-path")
            .arg(&packages)
            .arg(&pkg);
        process::run(&mut command).await?;

        if !VERBOSE.fetch(params)?.unwrap_or(false) {
            fs::remove_dir_all(&packages).await?;
            fs::remove_dir_all(&config_root).await?;
        }

        log::info!("✓ Created PKG: {}", pkg.display());
        Ok(pkg)
    }
}

fn render_distribution(params: &mut ParamMap, app_pkg: &Path) -> Result<String> {
    let license = match LICENSE_FILE.fetch(params)?.unwrap_or_default().first() {
        Some(license) => APP_RESOURCES_LIST
            .fetch(params)?
            .unwrap_or_default()
            .iter()
            .find(|set| set.contains(license))
            .map(|set| set.resolve(license).display().to_string()),
        None => None,
    };
    let data = DistributionData {
        title: APP_NAME.require(params)?,
        license,
        id: MAC_CF_BUNDLE_IDENTIFIER.require(params)?,
        version: VERSION.require(params)?,
        package: app_pkg
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };
    let dropin = DROP_IN_RESOURCES_ROOT.fetch(params)?;
    template::render(
        "distribution.dist",
        "PKG distribution file",
        DISTRIBUTION,
        &data,
        dropin.as_deref(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::params::RelativeFileSet;

    #[test]
    fn explicit_signing_without_installer_key_is_rejected() {
        let image = tempfile::tempdir().unwrap();
        let mut params = ParamMap::new();
        params.insert("mac.app.image", image.path().to_path_buf());
        params.insert("signBundle", "true");
        params.insert_null("mac.signing-key-developer-id-installer");
        let err = PkgBundler::for_host(Platform::Mac)
            .validate(&mut params)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Signature explicitly requested but no signing certificate specified."
        );
        assert!(err
            .advice()
            .unwrap_or_default()
            .contains("mac.signing-key-developer-id-installer"));
    }

    #[test]
    fn distribution_references_component_and_license() {
        let resources = tempfile::tempdir().unwrap();
        std::fs::write(resources.path().join("LICENSE.rtf"), b"{\\rtf1}").unwrap();

        let mut params = ParamMap::new();
        params.insert("name", "Hello");
        params.insert("identifier", "com.example.hello");
        params.insert("appVersion", "2.1");
        params.insert("licenseFile", "LICENSE.rtf");
        params.insert("appResources", RelativeFileSet::from_dir(resources.path()).unwrap());
        params.insert_null("dropinResourcesRoot");

        let dist = render_distribution(&mut params, Path::new("/tmp/packages/Hello-app.pkg"))
            .unwrap();
        assert!(dist.contains("<title>Hello</title>"));
        assert!(dist.contains(
            "<pkg-ref id=\"com.example.hello\" version=\"2.1\" onConclusion=\"none\">Hello-app.pkg</pkg-ref>"
        ));
        let license = resources.path().join("LICENSE.rtf");
        assert!(dist.contains(&format!("<license file=\"{}\"", license.display())));
    }
}
