//! Parameters shared by every bundler.
//!
//! Several defaults (main class, main jar, classpath, preloader, packaging
//! style) are sniffed from the manifests of the jars found in the application
//! resources. Sniffing writes every value it learns into the map at once, so
//! later lookups are plain cache hits.

use super::{
    BundlerParam, ParamInfo, ParamMap, ParamType, RelativeFileSet, no_default,
    parse::{
        parse_bool, parse_optional_bool, parse_properties, parse_resource_list, split_list,
        split_whitespace, split_with_quotes,
    },
};
use crate::bundler::error::{Error, ErrorExt, Result};
use std::{
    collections::BTreeMap,
    io::Read,
    marker::PhantomData,
    path::{Path, PathBuf},
};

const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";
const MANIFEST_MAIN_CLASS: &str = "Main-Class";
const MANIFEST_FX_MAIN: &str = "JavaFX-Application-Class";
const MANIFEST_PRELOADER: &str = "JavaFX-Preloader-Class";
const MANIFEST_CLASS_PATH: &str = "Class-Path";

pub static APP_RESOURCES: BundlerParam<RelativeFileSet> = BundlerParam {
    id: "appResources",
    name: "Resources",
    description: "All of the files to place in the resources directory, including the main jar.",
    default: no_default,
    parser: None,
    kind: PhantomData,
};

pub static APP_RESOURCES_LIST: BundlerParam<Vec<RelativeFileSet>> = BundlerParam {
    id: "appResourcesList",
    name: "Resources",
    description: "A list of file sets to place in the resources directory.",
    default: |p| Ok(Some(APP_RESOURCES.fetch(p)?.into_iter().collect())),
    parser: Some(|s, _| parse_resource_list(s).map(Some)),
    kind: PhantomData,
};

pub static SOURCE_DIR: BundlerParam<String> = BundlerParam {
    id: "srcdir",
    name: "Source directory",
    description: "Path to the directory containing the files to be bundled.",
    default: no_default,
    parser: Some(|s, _| Ok(Some(s.trim_end_matches(['/', '\\']).to_string()))),
    kind: PhantomData,
};

pub static MAIN_JAR: BundlerParam<RelativeFileSet> = BundlerParam {
    id: "mainJar",
    name: "Main Jar",
    description: "The main jar of the application, relative to the application resources.",
    default: |p| {
        sniff_main_jar(p)?;
        Ok(stored(p, "mainJar"))
    },
    parser: Some(locate_main_jar),
    kind: PhantomData,
};

pub static CLASSPATH: BundlerParam<String> = BundlerParam {
    id: "classpath",
    name: "Main Jar Classpath",
    description: "The classpath from the main jar, relative to the assembled application directory.",
    default: |p| {
        sniff_main_jar(p)?;
        Ok(Some(stored(p, "classpath").unwrap_or_default()))
    },
    parser: Some(|s, _| {
        let separator = if cfg!(windows) { ";" } else { ":" };
        Ok(Some(s.replace(separator, " ")))
    }),
    kind: PhantomData,
};

pub static MAIN_CLASS: BundlerParam<String> = BundlerParam {
    id: "applicationClass",
    name: "Main Class",
    description: "The main class of the application.",
    default: |p| {
        sniff_main_jar(p)?;
        Ok(stored(p, "applicationClass"))
    },
    parser: Some(|s, _| Ok(Some(s.to_string()))),
    kind: PhantomData,
};

pub static APP_NAME: BundlerParam<String> = BundlerParam {
    id: "name",
    name: "App Name",
    description: "The name of the application.",
    default: |p| {
        Ok(MAIN_CLASS
            .fetch(p)?
            .map(|class| match class.rfind('.') {
                Some(idx) => class[idx + 1..].to_string(),
                None => class,
            }))
    },
    parser: Some(|s, _| Ok(Some(s.to_string()))),
    kind: PhantomData,
};

pub static APP_FS_NAME: BundlerParam<String> = BundlerParam {
    id: "name.fs",
    name: "App File System Name",
    description: "The name of the application suitable for file system use.",
    default: |p| Ok(Some(to_fs_name(&APP_NAME.require(p)?))),
    parser: Some(|s, _| Ok(Some(s.to_string()))),
    kind: PhantomData,
};

pub static ICON: BundlerParam<PathBuf> = BundlerParam {
    id: "icon",
    name: "Icon",
    description: "The main icon of the application bundle.",
    default: no_default,
    parser: Some(|s, _| Ok(Some(PathBuf::from(s)))),
    kind: PhantomData,
};

pub static VENDOR: BundlerParam<String> = BundlerParam {
    id: "vendor",
    name: "Vendor",
    description: "The vendor of the application.",
    default: |_| Ok(Some("Unknown".into())),
    parser: Some(|s, _| Ok(Some(s.to_string()))),
    kind: PhantomData,
};

pub static CATEGORY: BundlerParam<String> = BundlerParam {
    id: "applicationCategory",
    name: "Category",
    description: "The category or group of the application.",
    default: |_| Ok(Some("Unknown".into())),
    parser: Some(|s, _| Ok(Some(s.to_string()))),
    kind: PhantomData,
};

pub static DESCRIPTION: BundlerParam<String> = BundlerParam {
    id: "description",
    name: "Description",
    description: "A longer description of the application.",
    default: |p| {
        if p.contains_key(APP_NAME.id) {
            APP_NAME.fetch(p)
        } else {
            Ok(Some("none".into()))
        }
    },
    parser: Some(|s, _| Ok(Some(s.to_string()))),
    kind: PhantomData,
};

pub static COPYRIGHT: BundlerParam<String> = BundlerParam {
    id: "copyright",
    name: "Copyright",
    description: "The copyright for the application.",
    default: |_| Ok(Some(format!("Copyright (C) {}", chrono::Local::now().format("%Y")))),
    parser: Some(|s, _| Ok(Some(s.to_string()))),
    kind: PhantomData,
};

pub static FX_PACKAGING: BundlerParam<bool> = BundlerParam {
    id: "fxPackaging",
    name: "FX Packaging",
    description: "Whether the main class is launched as a JavaFX application.",
    default: |p| {
        sniff_main_jar(p)?;
        Ok(Some(stored(p, "fxPackaging").unwrap_or(false)))
    },
    parser: Some(|s, _| Ok(Some(parse_bool(s)))),
    kind: PhantomData,
};

pub static ARGUMENTS: BundlerParam<Vec<String>> = BundlerParam {
    id: "arguments",
    name: "Command Line Arguments",
    description: "Arguments passed to the main class when the launcher is given none.",
    default: |_| Ok(Some(Vec::new())),
    parser: Some(|s, _| Ok(Some(split_with_quotes(s)))),
    kind: PhantomData,
};

pub static JVM_OPTIONS: BundlerParam<Vec<String>> = BundlerParam {
    id: "jvmOptions",
    name: "JVM Options",
    description: "JVM flags and options to be passed in.",
    default: |_| Ok(Some(Vec::new())),
    parser: Some(|s, _| Ok(Some(split_whitespace(s)))),
    kind: PhantomData,
};

pub static JVM_PROPERTIES: BundlerParam<BTreeMap<String, String>> = BundlerParam {
    id: "jvmProperties",
    name: "JVM System Properties",
    description: "JVM system properties of the -Dname=value variety.",
    default: |_| Ok(Some(BTreeMap::new())),
    parser: Some(|s, _| Ok(Some(parse_properties(s)))),
    kind: PhantomData,
};

pub static USER_JVM_OPTIONS: BundlerParam<BTreeMap<String, String>> = BundlerParam {
    id: "userJvmOptions",
    name: "User JVM Options",
    description: "JVM options the user may override, along with their default values.",
    default: |_| Ok(Some(BTreeMap::new())),
    parser: Some(|s, _| Ok(Some(parse_properties(s)))),
    kind: PhantomData,
};

pub static TITLE: BundlerParam<String> = BundlerParam {
    id: "title",
    name: "Title",
    description: "A title for the application.",
    default: |p| APP_NAME.fetch(p),
    parser: Some(|s, _| Ok(Some(s.to_string()))),
    kind: PhantomData,
};

pub static VERSION: BundlerParam<String> = BundlerParam {
    id: "appVersion",
    name: "Version",
    description: "The version of this application.",
    default: |_| Ok(Some("1.0".into())),
    parser: Some(|s, _| Ok(Some(s.to_string()))),
    kind: PhantomData,
};

pub static SYSTEM_WIDE: BundlerParam<bool> = BundlerParam {
    id: "systemWide",
    name: "System Wide",
    description: "Install system wide rather than per user. Unset means the platform default.",
    default: no_default,
    parser: Some(|s, _| Ok(parse_optional_bool(s))),
    kind: PhantomData,
};

pub static SERVICE_HINT: BundlerParam<bool> = BundlerParam {
    id: "serviceHint",
    name: "Service Hint",
    description: "Register the application as a service or daemon.",
    default: |_| Ok(Some(false)),
    parser: Some(|s, _| Ok(Some(parse_optional_bool(s).unwrap_or(false)))),
    kind: PhantomData,
};

pub static START_ON_INSTALL: BundlerParam<bool> = BundlerParam {
    id: "startOnInstall",
    name: "Start On Install",
    description: "Start the service right after installation.",
    default: |_| Ok(Some(false)),
    parser: Some(|s, _| Ok(Some(parse_optional_bool(s).unwrap_or(false)))),
    kind: PhantomData,
};

pub static STOP_ON_UNINSTALL: BundlerParam<bool> = BundlerParam {
    id: "stopOnUninstall",
    name: "Stop On Uninstall",
    description: "Stop the service before it is uninstalled.",
    default: |_| Ok(Some(true)),
    parser: Some(|s, _| Ok(Some(parse_optional_bool(s).unwrap_or(true)))),
    kind: PhantomData,
};

pub static RUN_AT_STARTUP: BundlerParam<bool> = BundlerParam {
    id: "runAtStartup",
    name: "Run At Startup",
    description: "Start the service during system startup.",
    default: |_| Ok(Some(false)),
    parser: Some(|s, _| Ok(Some(parse_optional_bool(s).unwrap_or(false)))),
    kind: PhantomData,
};

pub static SIGN_BUNDLE: BundlerParam<bool> = BundlerParam {
    id: "signBundle",
    name: "Sign Bundle",
    description: "Request that the bundle be signed. Unset lets each bundler decide.",
    default: no_default,
    parser: Some(|s, _| Ok(parse_optional_bool(s))),
    kind: PhantomData,
};

pub static SHORTCUT_HINT: BundlerParam<bool> = BundlerParam {
    id: "shortcutHint",
    name: "Shortcut Hint",
    description: "Create a desktop shortcut where the platform supports it.",
    default: |_| Ok(Some(false)),
    parser: Some(|s, _| Ok(Some(parse_optional_bool(s).unwrap_or(false)))),
    kind: PhantomData,
};

pub static MENU_HINT: BundlerParam<bool> = BundlerParam {
    id: "menuHint",
    name: "Menu Hint",
    description: "Add the application to the system menu where the platform supports it.",
    default: |_| Ok(Some(true)),
    parser: Some(|s, _| Ok(Some(parse_optional_bool(s).unwrap_or(true)))),
    kind: PhantomData,
};

pub static LICENSE_FILE: BundlerParam<Vec<String>> = BundlerParam {
    id: "licenseFile",
    name: "License",
    description: "License files, relative to the application resources.",
    default: |_| Ok(Some(Vec::new())),
    parser: Some(|s, _| {
        Ok(Some(
            s.split(',').map(str::trim).filter(|f| !f.is_empty()).map(String::from).collect(),
        ))
    }),
    kind: PhantomData,
};

pub static LICENSE_TYPE: BundlerParam<String> = BundlerParam {
    id: "licenseType",
    name: "License Type",
    description: "Short license name used when no license file is bundled.",
    default: |_| Ok(Some("Unknown".into())),
    parser: Some(|s, _| Ok(Some(s.to_string()))),
    kind: PhantomData,
};

pub static BUILD_ROOT: BundlerParam<PathBuf> = BundlerParam {
    id: "buildRoot",
    name: "Build Root",
    description: "The directory in which to place temporary files.",
    default: |_| {
        let dir = tempfile::Builder::new()
            .prefix("fxbundler")
            .tempdir()
            .fs_context("creating build root in", std::env::temp_dir())?;
        Ok(Some(dir.keep()))
    },
    parser: Some(|s, _| Ok(Some(PathBuf::from(s)))),
    kind: PhantomData,
};

pub static IDENTIFIER: BundlerParam<String> = BundlerParam {
    id: "identifier",
    name: "Identifier",
    description: "Machine readable identifier in reverse DNS order, such as com.example.app.",
    default: |p| match MAIN_CLASS.fetch(p)? {
        Some(class) => Ok(Some(match class.rfind('.') {
            Some(idx) if idx >= 1 => class[..idx].to_string(),
            _ => class,
        })),
        None => APP_NAME.fetch(p),
    },
    parser: Some(|s, _| Ok(Some(s.to_string()))),
    kind: PhantomData,
};

pub static PREFERENCES_ID: BundlerParam<String> = BundlerParam {
    id: "preferencesID",
    name: "Preferences ID",
    description: "Slash delimited preferences node holding user JVM options, such as com/example/app.",
    default: |p| Ok(Some(IDENTIFIER.fetch(p)?.unwrap_or_default().replace('.', "/"))),
    parser: Some(|s, _| Ok(Some(s.to_string()))),
    kind: PhantomData,
};

pub static PRELOADER: BundlerParam<String> = BundlerParam {
    id: "preloader",
    name: "JavaFX Preloader Class Name",
    description: "Fully qualified name of the preloader class, for JavaFX applications.",
    default: |p| {
        sniff_main_jar(p)?;
        Ok(stored(p, "preloader"))
    },
    parser: Some(|s, _| Ok(Some(s.to_string()))),
    kind: PhantomData,
};

pub static VERBOSE: BundlerParam<bool> = BundlerParam {
    id: "verbose",
    name: "Verbose",
    description: "Print more information and keep generated configuration files.",
    default: |_| Ok(Some(false)),
    parser: Some(|s, _| Ok(Some(parse_optional_bool(s).unwrap_or(true)))),
    kind: PhantomData,
};

pub static DROP_IN_RESOURCES_ROOT: BundlerParam<PathBuf> = BundlerParam {
    id: "dropinResourcesRoot",
    name: "Drop-In Resources Root",
    description: "Directory searched for files overriding the generated resources.",
    default: |_| Ok(Some(PathBuf::from("."))),
    parser: Some(|s, _| Ok(Some(PathBuf::from(s)))),
    kind: PhantomData,
};

pub static SECONDARY_LAUNCHERS: BundlerParam<Vec<ParamMap>> = BundlerParam {
    id: "secondaryLaunchers",
    name: "Secondary Launchers",
    description: "Parameter maps describing additional launchers.",
    default: |_| Ok(Some(Vec::new())),
    parser: None,
    kind: PhantomData,
};

pub static FILE_ASSOCIATIONS: BundlerParam<Vec<ParamMap>> = BundlerParam {
    id: "fileAssociations",
    name: "File Associations",
    description: "Parameter maps each describing a file association using the fileAssociation.* keys.",
    default: |_| Ok(Some(Vec::new())),
    parser: None,
    kind: PhantomData,
};

pub static FA_EXTENSIONS: BundlerParam<Vec<String>> = BundlerParam {
    id: "fileAssociation.extension",
    name: "File Association Extension",
    description: "File extensions to associate, without dots.",
    default: no_default,
    parser: Some(|s, _| Ok(Some(split_list(s)))),
    kind: PhantomData,
};

pub static FA_CONTENT_TYPE: BundlerParam<Vec<String>> = BundlerParam {
    id: "fileAssociation.contentType",
    name: "File Association Content Type",
    description: "MIME types to associate, such as application/x-vnd.example.",
    default: no_default,
    parser: Some(|s, _| Ok(Some(split_list(s)))),
    kind: PhantomData,
};

pub static FA_DESCRIPTION: BundlerParam<String> = BundlerParam {
    id: "fileAssociation.description",
    name: "File Association Description",
    description: "Description of the associated files. Defaults to \"<name> File\".",
    default: |p| Ok(Some(format!("{} File", APP_NAME.fetch(p)?.unwrap_or_default()))),
    parser: Some(|s, _| Ok(Some(s.to_string()))),
    kind: PhantomData,
};

pub static FA_ICON: BundlerParam<PathBuf> = BundlerParam {
    id: "fileAssociation.icon",
    name: "File Association Icon",
    description: "Icon for associated files. Defaults to the application icon.",
    default: |p| ICON.fetch(p),
    parser: Some(|s, _| Ok(Some(PathBuf::from(s)))),
    kind: PhantomData,
};

pub static MODULE: BundlerParam<String> = BundlerParam {
    id: "module",
    name: "Main Module",
    description: "The main module of the application, optionally with /main.Class.",
    default: no_default,
    parser: Some(|s, _| Ok(Some(s.to_string()))),
    kind: PhantomData,
};

pub static SINGLETON: BundlerParam<bool> = BundlerParam {
    id: "singleton",
    name: "Singleton",
    description: "Prevent launching multiple instances of the application.",
    default: |_| Ok(Some(false)),
    parser: Some(|s, _| Ok(Some(parse_bool(s)))),
    kind: PhantomData,
};

pub static RUNTIME: BundlerParam<RelativeFileSet> = BundlerParam {
    id: "runtime",
    name: "Runtime",
    description: "Runtime image copied into the bundle. Unset means no runtime is bundled.",
    default: no_default,
    parser: Some(|s, _| RelativeFileSet::from_dir(s).map(Some)),
    kind: PhantomData,
};

pub static LAUNCHER: BundlerParam<PathBuf> = BundlerParam {
    id: "launcher",
    name: "Launcher",
    description: "Native launcher executable. Without one a script launcher is generated.",
    default: no_default,
    parser: Some(|s, _| Ok(Some(PathBuf::from(s)))),
    kind: PhantomData,
};

pub static EMAIL: BundlerParam<String> = BundlerParam {
    id: "email",
    name: "Email",
    description: "Maintainer contact address.",
    default: |_| Ok(Some("Unknown".into())),
    parser: Some(|s, _| Ok(Some(s.to_string()))),
    kind: PhantomData,
};

pub static INSTALLDIR_CHOOSER: BundlerParam<bool> = BundlerParam {
    id: "installdirChooser",
    name: "Installation Directory Chooser",
    description: "Let the user pick the installation directory where the installer supports it.",
    default: |_| Ok(Some(false)),
    parser: Some(|s, _| Ok(Some(parse_bool(s)))),
    kind: PhantomData,
};

pub static ENABLE_APP_CDS: BundlerParam<bool> = BundlerParam {
    id: "commercial.AppCDS",
    name: "Enable AppCDS",
    description: "Package with Application Class Data Sharing, generating the shared archive at run or install time.",
    default: |_| Ok(Some(false)),
    parser: Some(|s, _| Ok(Some(parse_bool(s)))),
    kind: PhantomData,
};

/// Accepted values of [`APP_CDS_CACHE_MODE`].
pub const APP_CDS_CACHE_MODES: [&str; 3] = ["install", "auto", "auto+install"];

pub static APP_CDS_CACHE_MODE: BundlerParam<String> = BundlerParam {
    id: "commercial.AppCDS.cache",
    name: "AppCDS Cache Mode",
    description: "When the AppCDS archive is generated: 'install', 'auto' or 'auto+install'.",
    default: |_| Ok(Some("auto".into())),
    parser: Some(|s, _| {
        let mode = s.trim();
        if APP_CDS_CACHE_MODES.contains(&mode) {
            Ok(Some(mode.to_string()))
        } else {
            Err(Error::config(
                format!("Unknown AppCDS cache mode \"{mode}\"."),
                "Use one of 'install', 'auto' or 'auto+install'.",
            ))
        }
    }),
    kind: PhantomData,
};

pub static APP_CDS_CLASS_ROOTS: BundlerParam<Vec<String>> = BundlerParam {
    id: "commercial.AppCDS.classRoots",
    name: "AppCDS Root Classes",
    description: "Classes the AppCDS class list is generated from. Defaults to the main class.",
    default: |p| Ok(MAIN_CLASS.fetch(p)?.map(|class| vec![class])),
    parser: Some(|s, _| {
        Ok(Some(
            s.split([' ', ',', ':'])
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect(),
        ))
    }),
    kind: PhantomData,
};

/// Whether the installer should generate the AppCDS archive after installing.
pub fn app_cds_cache_on_install(params: &mut ParamMap) -> Result<bool> {
    if !ENABLE_APP_CDS.fetch(params)?.unwrap_or(false) {
        return Ok(false);
    }
    let mode = APP_CDS_CACHE_MODE.fetch(params)?.unwrap_or_default();
    Ok(mode == "install" || mode == "auto+install")
}

/// Every standard parameter, in declaration order.
pub fn all() -> Vec<&'static dyn ParamInfo> {
    vec![
        &APP_RESOURCES,
        &APP_RESOURCES_LIST,
        &SOURCE_DIR,
        &MAIN_JAR,
        &CLASSPATH,
        &MAIN_CLASS,
        &APP_NAME,
        &APP_FS_NAME,
        &ICON,
        &VENDOR,
        &CATEGORY,
        &DESCRIPTION,
        &COPYRIGHT,
        &FX_PACKAGING,
        &ARGUMENTS,
        &JVM_OPTIONS,
        &JVM_PROPERTIES,
        &USER_JVM_OPTIONS,
        &TITLE,
        &VERSION,
        &SYSTEM_WIDE,
        &SERVICE_HINT,
        &START_ON_INSTALL,
        &STOP_ON_UNINSTALL,
        &RUN_AT_STARTUP,
        &SIGN_BUNDLE,
        &SHORTCUT_HINT,
        &MENU_HINT,
        &LICENSE_FILE,
        &LICENSE_TYPE,
        &BUILD_ROOT,
        &IDENTIFIER,
        &PREFERENCES_ID,
        &PRELOADER,
        &VERBOSE,
        &DROP_IN_RESOURCES_ROOT,
        &SECONDARY_LAUNCHERS,
        &FILE_ASSOCIATIONS,
        &FA_EXTENSIONS,
        &FA_CONTENT_TYPE,
        &FA_DESCRIPTION,
        &FA_ICON,
        &MODULE,
        &SINGLETON,
        &RUNTIME,
        &LAUNCHER,
        &EMAIL,
        &INSTALLDIR_CHOOSER,
        &ENABLE_APP_CDS,
        &APP_CDS_CACHE_MODE,
        &APP_CDS_CLASS_ROOTS,
    ]
}

/// Strips whitespace and characters that are invalid in file names.
pub fn to_fs_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '\\' | '/' | '?' | ':' | '*' | '<' | '>' | '|'))
        .collect()
}

fn stored<T: ParamType>(map: &ParamMap, id: &str) -> Option<T> {
    map.get(id).and_then(T::from_value)
}

fn locate_main_jar(s: &str, map: &mut ParamMap) -> Result<Option<RelativeFileSet>> {
    for set in APP_RESOURCES_LIST.fetch(map)?.unwrap_or_default() {
        let base = set.base_directory();
        if base.join(s).exists() {
            return RelativeFileSet::new(base.to_path_buf(), [s]).map(Some);
        }
    }
    Err(Error::config(
        format!("The configured main jar does not exist {s}"),
        "The main jar must be specified relative to the app resources (not an absolute path), \
         and must exist within those resources.",
    ))
}

/// Reads the main-section attributes of a jar manifest.
///
/// Returns `None` when the archive has no manifest.
pub fn read_manifest(jar: &Path) -> Result<Option<BTreeMap<String, String>>> {
    let file = std::fs::File::open(jar).fs_context("opening jar", jar)?;
    let mut archive = zip::ZipArchive::new(file)?;
    let mut text = String::new();
    match archive.by_name(MANIFEST_PATH) {
        Ok(mut entry) => {
            entry.read_to_string(&mut text).fs_context("reading manifest of", jar)?;
        }
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    Ok(Some(parse_manifest(&text)))
}

fn parse_manifest(text: &str) -> BTreeMap<String, String> {
    let mut attrs: BTreeMap<String, String> = BTreeMap::new();
    let mut last: Option<String> = None;
    for line in text.lines() {
        if line.is_empty() {
            // main section ends at the first blank line
            break;
        }
        if let Some(rest) = line.strip_prefix(' ') {
            if let Some(value) = last.as_ref().and_then(|k| attrs.get_mut(k)) {
                value.push_str(rest);
            }
            continue;
        }
        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim().to_string();
            attrs.insert(key.clone(), value.trim_start().to_string());
            last = Some(key);
        }
    }
    attrs
}

/// Learns main class, main jar, classpath, preloader and packaging style
/// from the first jar whose manifest names a usable main class.
fn sniff_main_jar(map: &mut ParamMap) -> Result<()> {
    let has_main_class = map.contains_key(MAIN_CLASS.id);
    let has_main_jar = map.contains_key(MAIN_JAR.id);
    let has_class_path = map.contains_key(CLASSPATH.id);
    let has_preloader = map.contains_key(PRELOADER.id);

    if (has_main_class && has_main_jar && has_class_path) || map.contains_key(MODULE.id) {
        return Ok(());
    }

    let mut candidates: Vec<(PathBuf, String)> = Vec::new();
    if has_main_jar {
        if let Some(jar) = MAIN_JAR.fetch(map)? {
            for file in jar.included_files() {
                candidates.push((jar.base_directory().to_path_buf(), file.to_string()));
            }
        }
    } else if has_class_path {
        let class_path = CLASSPATH.fetch(map)?.unwrap_or_default();
        if let Some(resources) = APP_RESOURCES.fetch(map)? {
            for entry in class_path.split_whitespace() {
                candidates.push((resources.base_directory().to_path_buf(), entry.to_string()));
            }
        }
    } else {
        for set in APP_RESOURCES_LIST.fetch(map)?.unwrap_or_default() {
            for file in set.included_files() {
                candidates.push((set.base_directory().to_path_buf(), file.to_string()));
            }
        }
    }

    let declared: Option<String> = stored(map, MAIN_CLASS.id);

    for (base, relative) in candidates {
        if !relative.to_lowercase().ends_with(".jar") {
            continue;
        }
        let jar = base.join(&relative);
        if !jar.exists() {
            continue;
        }
        let attrs = match read_manifest(&jar) {
            Ok(Some(attrs)) => attrs,
            Ok(None) => continue,
            Err(e) => {
                log::debug!("Skipping {}: {e}", jar.display());
                continue;
            }
        };
        let main_class = attrs.get(MANIFEST_MAIN_CLASS);
        let fx_main = attrs.get(MANIFEST_FX_MAIN);

        if let Some(declared) = &declared {
            if fx_main == Some(declared) {
                FX_PACKAGING.set(map, true);
            } else if main_class == Some(declared) {
                FX_PACKAGING.set(map, false);
            } else {
                if let Some(fx_main) = fx_main {
                    log::info!(
                        "The jar {relative} has an FX Application class {fx_main} that does not match the declared main {declared}"
                    );
                }
                if let Some(main_class) = main_class {
                    log::info!(
                        "The jar {relative} has a main class {main_class} that does not match the declared main {declared}"
                    );
                }
                continue;
            }
        } else if let Some(fx_main) = fx_main {
            FX_PACKAGING.set(map, true);
            MAIN_CLASS.set(map, fx_main.clone());
        } else if let Some(main_class) = main_class {
            FX_PACKAGING.set(map, false);
            MAIN_CLASS.set(map, main_class.clone());
        } else {
            continue;
        }

        if !has_preloader {
            if let Some(preloader) = attrs.get(MANIFEST_PRELOADER) {
                PRELOADER.set(map, preloader.clone());
            }
        }
        if !has_main_jar {
            MAIN_JAR.set(map, RelativeFileSet::new(base, [relative.as_str()])?);
        }
        if !has_class_path {
            CLASSPATH.set(map, attrs.get(MANIFEST_CLASS_PATH).cloned().unwrap_or_default());
        }
        break;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_jar(path: &Path, manifest: &str) {
        let file = std::fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file(MANIFEST_PATH, zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(manifest.as_bytes()).unwrap();
        zip.finish().unwrap();
    }

    #[test]
    fn name_and_identifier_follow_main_class() {
        let mut map = ParamMap::new();
        map.insert("applicationClass", "com.example.hello.Main");
        assert_eq!(APP_NAME.require(&mut map).unwrap(), "Main");
        assert_eq!(IDENTIFIER.require(&mut map).unwrap(), "com.example.hello");
        assert_eq!(PREFERENCES_ID.require(&mut map).unwrap(), "com/example/hello");
        assert_eq!(TITLE.require(&mut map).unwrap(), "Main");
    }

    #[test]
    fn manifest_continuation_lines_are_joined() {
        let attrs = parse_manifest(
            "Manifest-Version: 1.0\nMain-Class: com.example.hel\n lo.Main\nClass-Path: a.jar\n\nName: x\nMain-Class: other\n",
        );
        assert_eq!(attrs.get("Main-Class").map(String::as_str), Some("com.example.hello.Main"));
        assert_eq!(attrs.get("Class-Path").map(String::as_str), Some("a.jar"));
        assert_eq!(attrs.len(), 3);
    }

    #[test]
    fn unreadable_runtime_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut map = ParamMap::new();
        map.insert("runtime", dir.path().join("jre").display().to_string());
        let err = RUNTIME.fetch(&mut map).unwrap_err();
        assert!(err.is_config());
        assert!(err.advice().is_some_and(|a| a.contains("'runtime'")));
    }

    #[test]
    fn malformed_resource_glob_is_a_config_error() {
        let mut map = ParamMap::new();
        map.insert("appResourcesList", "dist/[a.jar");
        let err = APP_RESOURCES_LIST.fetch(&mut map).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("dist/[a.jar"));
    }

    #[test]
    fn identifier_without_package_is_the_class() {
        let mut map = ParamMap::new();
        map.insert("applicationClass", "Hello");
        assert_eq!(IDENTIFIER.require(&mut map).unwrap(), "Hello");
    }

    #[test]
    fn fs_name_drops_unsafe_characters() {
        let mut map = ParamMap::new();
        map.insert("name", "My App: v2/beta?");
        assert_eq!(APP_FS_NAME.require(&mut map).unwrap(), "MyAppv2beta");
    }

    #[test]
    fn description_falls_back_to_none_without_a_name() {
        let mut map = ParamMap::new();
        assert_eq!(DESCRIPTION.require(&mut map).unwrap(), "none");

        let mut named = ParamMap::new();
        named.insert("name", "Tetris");
        assert_eq!(DESCRIPTION.require(&mut named).unwrap(), "Tetris");
    }

    #[test]
    fn repeated_resolution_is_stable() {
        let mut map = ParamMap::new();
        map.insert("applicationClass", "org.demo.Game");
        let first = APP_FS_NAME.require(&mut map).unwrap();
        let snapshot = map.clone();
        assert_eq!(APP_FS_NAME.require(&mut map).unwrap(), first);
        assert_eq!(map, snapshot);
        assert!(COPYRIGHT.require(&mut map).unwrap().starts_with("Copyright (C) "));
    }

    #[test]
    fn nullable_flags_keep_null() {
        let mut map = ParamMap::new();
        map.insert("signBundle", "null");
        map.insert("stopOnUninstall", "null");
        assert_eq!(SIGN_BUNDLE.fetch(&mut map).unwrap(), None);
        assert_eq!(STOP_ON_UNINSTALL.fetch(&mut map).unwrap(), Some(true));
        assert_eq!(SYSTEM_WIDE.fetch(&mut map).unwrap(), None);
    }

    #[test]
    fn main_class_is_sniffed_from_jar_manifest() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("readme.txt"), b"hi").unwrap();
        write_jar(
            &dir.path().join("app.jar"),
            "Manifest-Version: 1.0\r\nMain-Class: org.demo.Mines\r\nClass-Path: lib/a.jar li\r\n \
             b/b.jar\r\nJavaFX-Preloader-Class: org.demo.Splash\r\n\r\nName: x\r\n",
        );

        let mut map = ParamMap::new();
        map.insert("appResources", RelativeFileSet::from_dir(dir.path()).unwrap());

        assert_eq!(MAIN_CLASS.require(&mut map).unwrap(), "org.demo.Mines");
        assert_eq!(CLASSPATH.require(&mut map).unwrap(), "lib/a.jar lib/b.jar");
        assert_eq!(PRELOADER.require(&mut map).unwrap(), "org.demo.Splash");
        assert!(!FX_PACKAGING.require(&mut map).unwrap());
        let jar = MAIN_JAR.require(&mut map).unwrap();
        assert!(jar.contains("app.jar"));
        assert_eq!(APP_NAME.require(&mut map).unwrap(), "Mines");
    }

    #[test]
    fn fx_application_class_wins_over_main_class() {
        let dir = tempfile::tempdir().unwrap();
        write_jar(
            &dir.path().join("fx.jar"),
            "Main-Class: boot.Launcher\nJavaFX-Application-Class: org.demo.FxMain\n",
        );
        let mut map = ParamMap::new();
        map.insert("appResources", RelativeFileSet::from_dir(dir.path()).unwrap());
        assert_eq!(MAIN_CLASS.require(&mut map).unwrap(), "org.demo.FxMain");
        assert!(FX_PACKAGING.require(&mut map).unwrap());
    }

    #[test]
    fn configured_main_jar_must_exist_in_resources() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app.jar"), b"").unwrap();
        let mut map = ParamMap::new();
        map.insert("appResources", RelativeFileSet::from_dir(dir.path()).unwrap());
        map.insert("mainJar", "missing.jar");
        let err = MAIN_JAR.fetch(&mut map).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("missing.jar"));

        map.insert("mainJar", "app.jar");
        assert!(MAIN_JAR.require(&mut map).unwrap().contains("app.jar"));
    }

    #[test]
    fn standard_ids_are_unique() {
        let mut ids: Vec<_> = all().iter().map(|p| p.id()).collect();
        let count = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), count);
    }
}
