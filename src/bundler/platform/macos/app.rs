//! macOS `.app` bundle.
//!
//! ```text
//! <out>/<name.fs>.app/Contents/
//!   Info.plist
//!   PkgInfo
//!   MacOS/<name.fs>                        launcher
//!   Java/<name.fs>.cfg                     launcher config
//!   Java/...                               application resources
//!   Resources/<name.fs>.icns
//!   PlugIns/Java.runtime/Contents/Home     bundled runtime, if any
//!   PlugIns/Java.runtime/Contents/Info.plist
//! ```

use super::{
    DEVELOPER_ID_APP_SIGNING_KEY, ICON_ICNS, MAC_CATEGORY, MAC_CF_BUNDLE_IDENTIFIER,
    MAC_CF_BUNDLE_NAME, MAC_CF_BUNDLE_VERSION, SIGNING_KEYCHAIN, SIGNING_KEY_USER,
    valid_bundle_version, validate_bundle_identifier,
};
use crate::bundler::{
    BundleType, Bundler, Platform,
    builder::signing,
    error::{Error, Result},
    image::{
        self, cfg,
        launcher::{self, LauncherLayout},
    },
    params::{ParamInfo, ParamMap, standard::*},
    utils::{fs, template},
};
use async_trait::async_trait;
use plist::{Dictionary, Value};
use std::path::{Path, PathBuf};

const RUNTIME_LOCATION: &str = "$APPDIR/PlugIns/Java.runtime";

/// Package type and creator code.
const PKG_INFO: &str = "APPL????";

/// Builds `mac.app` bundles.
#[derive(Debug, Clone)]
pub struct MacAppBundler {
    host: Platform,
}

impl Default for MacAppBundler {
    fn default() -> Self {
        Self::for_host(Platform::current())
    }
}

impl MacAppBundler {
    /// A bundler that validates as if running on `host`.
    pub fn for_host(host: Platform) -> Self {
        Self { host }
    }

    /// Validation shared with the installers built on top of the bundle.
    pub(super) fn validate_bundle(&self, params: &mut ParamMap) -> Result<()> {
        image::require_host(self.host, Platform::Mac)?;
        image::validate_runtime(params)?;
        image::validate_image(params)?;
        validate_bundle_identifier(params)?;

        let version = MAC_CF_BUNDLE_VERSION.require(params)?;
        if !valid_bundle_version(&version) {
            return Err(Error::config(
                format!("Invalid CFBundleVersion - '{version}'"),
                "Set a compatible 'appVersion' or set a 'mac.CFBundleVersion'. \
                 Valid versions are one to three integers separated by dots.",
            ));
        }

        // only an explicit request fails; unset signs when a key is found
        if SIGN_BUNDLE.fetch(params)?.unwrap_or(false)
            && DEVELOPER_ID_APP_SIGNING_KEY.fetch(params)?.is_none()
        {
            return Err(Error::config(
                "Signature explicitly requested but no signing certificate specified.",
                "Either specify a valid cert in 'mac.signing-key-developer-id-app' or unset \
                 'signBundle' or set 'signBundle' to false.",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Bundler for MacAppBundler {
    fn name(&self) -> &'static str {
        "Mac Application Image"
    }

    fn id(&self) -> &'static str {
        "mac.app"
    }

    fn description(&self) -> &'static str {
        "A directory based image of a Mac application with an optionally co-bundled runtime. \
         Used as a base for the installer bundlers."
    }

    fn bundle_type(&self) -> BundleType {
        BundleType::Image
    }

    fn params(&self) -> Vec<&'static dyn ParamInfo> {
        app_params()
    }

    fn validate(&self, params: &mut ParamMap) -> Result<()> {
        self.validate_bundle(params)
    }

    async fn execute(&self, params: &mut ParamMap, outdir: &Path) -> Result<PathBuf> {
        log::info!("Creating app bundle: {}", outdir.display());
        let bundle = build_bundle(params, outdir).await?;
        log::info!("✓ Created app bundle: {}", bundle.display());
        Ok(bundle)
    }
}

/// Parameters read by the `.app` bundle.
pub(super) fn app_params() -> Vec<&'static dyn ParamInfo> {
    vec![
        &APP_NAME,
        &APP_RESOURCES,
        &ARGUMENTS,
        &CLASSPATH,
        &COPYRIGHT,
        &DEVELOPER_ID_APP_SIGNING_KEY,
        &ICON_ICNS,
        &JVM_OPTIONS,
        &JVM_PROPERTIES,
        &MAC_CATEGORY,
        &MAC_CF_BUNDLE_IDENTIFIER,
        &MAC_CF_BUNDLE_NAME,
        &MAC_CF_BUNDLE_VERSION,
        &MAIN_CLASS,
        &MAIN_JAR,
        &MODULE,
        &PREFERENCES_ID,
        &PRELOADER,
        &RUNTIME,
        &SIGN_BUNDLE,
        &SIGNING_KEYCHAIN,
        &SIGNING_KEY_USER,
        &USER_JVM_OPTIONS,
        &VERSION,
        &LAUNCHER,
        &FILE_ASSOCIATIONS,
        &ENABLE_APP_CDS,
        &APP_CDS_CACHE_MODE,
        &APP_CDS_CLASS_ROOTS,
    ]
}

/// Assembles `<name.fs>.app` below `outdir`, signing it when a key is known.
pub(super) async fn build_bundle(params: &mut ParamMap, outdir: &Path) -> Result<PathBuf> {
    let fs_name = APP_FS_NAME.require(params)?;
    let root = outdir.join(format!("{fs_name}.app"));
    fs::create_dir_all(&root, true).await?;

    let contents = root.join("Contents");
    let java_dir = contents.join("Java");
    let resources_dir = contents.join("Resources");
    fs::create_dir_all(&contents.join("MacOS"), false).await?;
    fs::create_dir_all(&java_dir, false).await?;
    fs::create_dir_all(&resources_dir, false).await?;

    fs::write_file(&contents.join("PkgInfo"), PKG_INFO).await?;
    image::copy_application(params, &java_dir).await?;

    let runtime = contents.join("PlugIns").join("Java.runtime").join("Contents");
    if image::copy_runtime(params, &runtime.join("Home")).await? {
        write_plist(&runtime.join("Info.plist"), &runtime_info_plist(params)?).await?;
    }

    write_launcher_files(params, &contents).await?;
    for mut secondary in image::secondary_launchers(params)? {
        write_launcher_files(&mut secondary, &contents).await?;
    }

    let dropin = DROP_IN_RESOURCES_ROOT.fetch(params)?;
    let icon_name = format!("{fs_name}.icns");
    let icon = ICON_ICNS.fetch(params)?;
    let icon = template::resource_file(&icon_name, "icon", icon.as_deref(), dropin.as_deref());
    if let Some(icon) = &icon {
        fs::copy_file(icon, &resources_dir.join(&icon_name)).await?;
    }
    for entry in FILE_ASSOCIATIONS.fetch(params)?.unwrap_or_default() {
        let mut assoc = params.clone();
        assoc.extend(&entry);
        if let Some(fa_icon) = FA_ICON.fetch(&mut assoc)?.filter(|i| i.is_file()) {
            if let Some(name) = fa_icon.file_name() {
                fs::copy_file(&fa_icon, &resources_dir.join(name)).await?;
            }
        }
    }

    let info = contents.join("Info.plist");
    match template::resource_file("Info.plist", "Application Info.plist", None, dropin.as_deref()) {
        Some(custom) => fs::copy_file(&custom, &info).await?,
        None => write_plist(&info, &info_plist(params, icon.is_some())?).await?,
    }

    if SIGN_BUNDLE.fetch(params)?.unwrap_or(true) {
        if let Some(identity) = DEVELOPER_ID_APP_SIGNING_KEY.fetch(params)? {
            let keychain = SIGNING_KEYCHAIN.fetch(params)?;
            signing::codesign(&root, &identity, keychain.as_deref()).await?;
        }
    }

    Ok(root)
}

async fn write_launcher_files(params: &mut ParamMap, contents: &Path) -> Result<()> {
    let fs_name = APP_FS_NAME.require(params)?;
    cfg::write_cfg(
        params,
        &contents.join("Java").join(format!("{fs_name}.cfg")),
        RUNTIME_LOCATION,
        Platform::Mac,
    )
    .await?;
    launcher::write_launcher(
        params,
        &contents.join("MacOS"),
        LauncherLayout::MAC_BUNDLE,
        Platform::Mac,
    )
    .await?;
    Ok(())
}

async fn write_plist(path: &Path, dict: &Dictionary) -> Result<()> {
    let mut xml = Vec::new();
    Value::Dictionary(dict.clone()).to_writer_xml(&mut xml)?;
    fs::write_file(path, xml).await
}

fn string(value: impl Into<String>) -> Value {
    Value::String(value.into())
}

fn info_plist(params: &mut ParamMap, has_icon: bool) -> Result<Dictionary> {
    let fs_name = APP_FS_NAME.require(params)?;
    let identifier = MAC_CF_BUNDLE_IDENTIFIER.require(params)?;

    let mut dict = Dictionary::new();
    dict.insert("LSMinimumSystemVersion".into(), string("10.9"));
    dict.insert("CFBundleDevelopmentRegion".into(), string("English"));
    dict.insert("CFBundleAllowMixedLocalizations".into(), Value::Boolean(true));
    dict.insert("CFBundleExecutable".into(), string(fs_name.as_str()));
    if has_icon {
        dict.insert("CFBundleIconFile".into(), string(format!("{fs_name}.icns")));
    }
    dict.insert("CFBundleIdentifier".into(), string(identifier.as_str()));
    dict.insert("CFBundleInfoDictionaryVersion".into(), string("6.0"));
    dict.insert("CFBundleName".into(), string(MAC_CF_BUNDLE_NAME.require(params)?));
    dict.insert("CFBundlePackageType".into(), string("APPL"));
    dict.insert("CFBundleShortVersionString".into(), string(VERSION.require(params)?));
    dict.insert("CFBundleSignature".into(), string("????"));
    dict.insert("CFBundleVersion".into(), string(MAC_CF_BUNDLE_VERSION.require(params)?));
    dict.insert("LSApplicationCategoryType".into(), string(MAC_CATEGORY.require(params)?));
    dict.insert(
        "NSHumanReadableCopyright".into(),
        string(COPYRIGHT.fetch(params)?.unwrap_or_else(|| "Unknown".into())),
    );
    dict.insert("NSHighResolutionCapable".into(), string("true"));

    let mut document_types = Vec::new();
    let mut exported_types = Vec::new();
    for entry in FILE_ASSOCIATIONS.fetch(params)?.unwrap_or_default() {
        let mut assoc = params.clone();
        assoc.extend(&entry);
        let extensions = FA_EXTENSIONS.fetch(&mut assoc)?.unwrap_or_default();
        let mimes = FA_CONTENT_TYPE.fetch(&mut assoc)?.unwrap_or_default();
        let description = FA_DESCRIPTION.fetch(&mut assoc)?.unwrap_or_default();
        let icon = FA_ICON
            .fetch(&mut assoc)?
            .filter(|i| i.is_file())
            .and_then(|i| i.file_name().map(|n| n.to_string_lossy().into_owned()));
        let content_type = format!(
            "{identifier}.{}",
            extensions.first().map(String::as_str).unwrap_or("mime")
        );

        let mut document = Dictionary::new();
        document.insert(
            "LSItemContentTypes".into(),
            Value::Array(vec![string(content_type.as_str())]),
        );
        document.insert("CFBundleTypeName".into(), string(description.as_str()));
        document.insert("LSHandlerRank".into(), string("Owner"));
        document.insert("CFBundleTypeRole".into(), string("Editor"));
        document.insert("LSIsAppleDefaultForType".into(), Value::Boolean(true));
        if let Some(icon) = &icon {
            document.insert("CFBundleTypeIconFile".into(), string(icon.as_str()));
        }
        document_types.push(Value::Dictionary(document));

        let mut tags = Dictionary::new();
        if !extensions.is_empty() {
            tags.insert(
                "public.filename-extension".into(),
                Value::Array(extensions.into_iter().map(Value::String).collect()),
            );
        }
        if !mimes.is_empty() {
            tags.insert(
                "public.mime-type".into(),
                Value::Array(mimes.into_iter().map(Value::String).collect()),
            );
        }
        let mut exported = Dictionary::new();
        exported.insert("UTTypeIdentifier".into(), string(content_type));
        exported.insert("UTTypeDescription".into(), string(description));
        exported.insert(
            "UTTypeConformsTo".into(),
            Value::Array(vec![string("public.data")]),
        );
        if let Some(icon) = icon {
            exported.insert("UTTypeIconFile".into(), string(icon));
        }
        exported.insert("UTTypeTagSpecification".into(), Value::Dictionary(tags));
        exported_types.push(Value::Dictionary(exported));
    }
    if !document_types.is_empty() {
        dict.insert("CFBundleDocumentTypes".into(), Value::Array(document_types));
        dict.insert("UTExportedTypeDeclarations".into(), Value::Array(exported_types));
    }

    Ok(dict)
}

fn runtime_info_plist(params: &mut ParamMap) -> Result<Dictionary> {
    let version = VERSION.require(params)?;
    let mut dict = Dictionary::new();
    dict.insert("CFBundleDevelopmentRegion".into(), string("English"));
    dict.insert(
        "CFBundleIdentifier".into(),
        string(format!("com.oracle.java.{}", MAC_CF_BUNDLE_IDENTIFIER.require(params)?)),
    );
    dict.insert("CFBundleInfoDictionaryVersion".into(), string("6.0"));
    dict.insert("CFBundleName".into(), string("Java Runtime Image"));
    dict.insert("CFBundlePackageType".into(), string("BNDL"));
    dict.insert("CFBundleShortVersionString".into(), string(version.as_str()));
    dict.insert("CFBundleSignature".into(), string("????"));
    dict.insert("CFBundleVersion".into(), string(version));
    Ok(dict)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::params::RelativeFileSet;

    fn minimal(resources: &Path) -> ParamMap {
        std::fs::write(resources.join("hello.jar"), b"jar").unwrap();
        let mut params = ParamMap::new();
        params.insert("name", "Hello");
        params.insert("applicationClass", "com.example.hello.Main");
        params.insert("appResources", RelativeFileSet::from_dir(resources).unwrap());
        params.insert("appVersion", "1.4.2");
        params.insert_null("dropinResourcesRoot");
        params.insert_null("mac.signing-key-developer-id-app");
        params
    }

    #[test]
    fn refuses_other_hosts() {
        let resources = tempfile::tempdir().unwrap();
        let mut params = minimal(resources.path());
        let err = MacAppBundler::for_host(Platform::Linux)
            .validate(&mut params)
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedPlatform));
        MacAppBundler::for_host(Platform::Mac)
            .validate(&mut params)
            .unwrap();
    }

    #[test]
    fn digit_leading_identifier_segment_is_rejected() {
        let resources = tempfile::tempdir().unwrap();
        let mut params = minimal(resources.path());
        params.insert("identifier", "com.2fast.app");
        let err = MacAppBundler::for_host(Platform::Mac)
            .validate(&mut params)
            .unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("com.2fast.app"));
    }

    #[test]
    fn explicit_signing_without_key_is_rejected() {
        let resources = tempfile::tempdir().unwrap();
        let mut params = minimal(resources.path());
        params.insert("signBundle", "true");
        let err = MacAppBundler::for_host(Platform::Mac)
            .validate(&mut params)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Signature explicitly requested but no signing certificate specified."
        );
        assert!(err.advice().unwrap_or_default().contains("mac.signing-key-developer-id-app"));
    }

    #[tokio::test]
    async fn bundle_layout() {
        let resources = tempfile::tempdir().unwrap();
        let runtime = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(runtime.path().join("legal/java.base")).unwrap();
        std::fs::write(runtime.path().join("legal/java.base/LICENSE"), b"GPL").unwrap();

        let mut params = minimal(resources.path());
        params.insert("runtime", RelativeFileSet::from_dir(runtime.path()).unwrap());
        params.insert("applicationCategory", "Developer Tools");

        let bundle = build_bundle(&mut params, out.path()).await.unwrap();
        assert_eq!(bundle, out.path().join("Hello.app"));

        let contents = bundle.join("Contents");
        assert_eq!(std::fs::read_to_string(contents.join("PkgInfo")).unwrap(), "APPL????");
        assert!(contents.join("MacOS/Hello").is_file());
        assert!(contents.join("Java/hello.jar").is_file());
        assert!(contents
            .join("PlugIns/Java.runtime/Contents/Home/legal/java.base/LICENSE")
            .is_file());

        let cfg = std::fs::read_to_string(contents.join("Java/Hello.cfg")).unwrap();
        assert!(cfg.contains("app.runtime=$APPDIR/PlugIns/Java.runtime\n"));

        let info = Value::from_file(contents.join("Info.plist")).unwrap();
        let info = info.as_dictionary().unwrap();
        assert_eq!(
            info.get("CFBundleIdentifier").and_then(Value::as_string),
            Some("com.example.hello")
        );
        assert_eq!(info.get("CFBundleVersion").and_then(Value::as_string), Some("1.4.2"));
        assert_eq!(
            info.get("LSApplicationCategoryType").and_then(Value::as_string),
            Some("public.app-category.developer-tools")
        );
        assert!(info.get("CFBundleIconFile").is_none());

        let runtime_info =
            Value::from_file(contents.join("PlugIns/Java.runtime/Contents/Info.plist")).unwrap();
        assert_eq!(
            runtime_info
                .as_dictionary()
                .and_then(|d| d.get("CFBundleIdentifier"))
                .and_then(Value::as_string),
            Some("com.oracle.java.com.example.hello")
        );
    }

    #[tokio::test]
    async fn association_without_icon_uses_the_app_icon() {
        let resources = tempfile::tempdir().unwrap();
        let icons = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let icon = icons.path().join("app.icns");
        std::fs::write(&icon, b"icns").unwrap();

        let mut params = minimal(resources.path());
        params.insert("icon", icon.display().to_string());
        let assoc: ParamMap = [
            ("fileAssociation.extension", "hel"),
            ("fileAssociation.contentType", "application/x-hello"),
        ]
        .into_iter()
        .collect();
        params.insert("fileAssociations", vec![assoc]);

        let bundle = build_bundle(&mut params, out.path()).await.unwrap();
        let contents = bundle.join("Contents");
        assert!(contents.join("Resources/Hello.icns").is_file());
        assert!(contents.join("Resources/app.icns").is_file());

        let info = Value::from_file(contents.join("Info.plist")).unwrap();
        let document = info
            .as_dictionary()
            .and_then(|d| d.get("CFBundleDocumentTypes"))
            .and_then(Value::as_array)
            .unwrap()[0]
            .as_dictionary()
            .unwrap();
        assert_eq!(
            document.get("CFBundleTypeIconFile").and_then(Value::as_string),
            Some("app.icns")
        );
    }

    #[test]
    fn file_associations_in_info_plist() {
        let mut assoc: ParamMap = [
            ("fileAssociation.extension", "hel"),
            ("fileAssociation.contentType", "application/x-hello"),
            ("fileAssociation.description", "Hello Document"),
        ]
        .into_iter()
        .collect();
        assoc.insert_null("fileAssociation.icon");

        let mut params = ParamMap::new();
        params.insert("name", "Hello");
        params.insert("identifier", "com.example.hello");
        params.insert("fileAssociations", vec![assoc]);

        let dict = info_plist(&mut params, false).unwrap();
        let documents = dict
            .get("CFBundleDocumentTypes")
            .and_then(Value::as_array)
            .unwrap();
        let document = documents[0].as_dictionary().unwrap();
        assert_eq!(
            document.get("LSItemContentTypes").and_then(Value::as_array).unwrap()[0].as_string(),
            Some("com.example.hello.hel")
        );
        assert_eq!(
            document.get("CFBundleTypeName").and_then(Value::as_string),
            Some("Hello Document")
        );
    }
}
