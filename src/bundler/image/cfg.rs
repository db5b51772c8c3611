//! Launcher configuration file (`<name.fs>.cfg`).
//!
//! The launcher reads this INI-style file to find the runtime, the classpath
//! and the entry point. Sections are separated by a blank line.

use crate::bundler::{
    Platform,
    error::Result,
    params::{ParamMap, standard::*},
    utils::fs,
};
use std::{fmt::Write as _, path::Path};

/// Renders the config file for the launcher described by `params`.
///
/// # Arguments
///
/// * `params` - parameters of the launcher (base map or a secondary launcher map)
/// * `runtime_location` - value of `app.runtime`, e.g. `$APPDIR/runtime`
/// * `platform` - decides the classpath separator
pub fn render_cfg(
    params: &mut ParamMap,
    runtime_location: &str,
    platform: Platform,
) -> Result<String> {
    let mut out = String::new();

    out.push_str("[Application]\n");
    line(&mut out, "app.name", &APP_NAME.fetch(params)?.unwrap_or_default());
    line(&mut out, "app.version", &VERSION.fetch(params)?.unwrap_or_default());
    line(
        &mut out,
        "app.preferences.id",
        &PREFERENCES_ID.fetch(params)?.unwrap_or_default(),
    );
    line(&mut out, "app.runtime", runtime_location);
    line(&mut out, "app.identifier", &IDENTIFIER.fetch(params)?.unwrap_or_default());
    line(
        &mut out,
        "app.classpath",
        &join_classpath(&CLASSPATH.fetch(params)?.unwrap_or_default(), platform),
    );
    let instance = if SINGLETON.fetch(params)?.unwrap_or(false) {
        "single"
    } else {
        "multiple"
    };
    line(&mut out, "app.application.instance", instance);
    let app_cds = ENABLE_APP_CDS.fetch(params)?.unwrap_or(false);
    if app_cds {
        let mode = APP_CDS_CACHE_MODE.fetch(params)?.unwrap_or_default();
        line(&mut out, "app.appcds.cache", mode.split('+').next().unwrap_or_default());
    }

    match MODULE.fetch(params)? {
        Some(module) => line(&mut out, "app.mainmodule", &module),
        None => {
            if let Some(jar) = MAIN_JAR.fetch(params)? {
                if let Some(file) = jar.included_files().next() {
                    let name = file.rsplit('/').next().unwrap_or(file);
                    line(&mut out, "app.mainjar", name);
                }
            }
            if let Some(class) = MAIN_CLASS.fetch(params)? {
                line(&mut out, "app.mainclass", &class.replace('.', "/"));
            }
        }
    }

    out.push_str("\n[JVMOptions]\n");
    for option in JVM_OPTIONS.fetch(params)?.unwrap_or_default() {
        out.push_str(&option);
        out.push('\n');
    }
    for (key, value) in JVM_PROPERTIES.fetch(params)?.unwrap_or_default() {
        let _ = writeln!(out, "-D{key}={value}");
    }
    if let Some(preloader) = PRELOADER.fetch(params)? {
        let _ = writeln!(out, "-Djavafx.preloader={preloader}");
    }

    out.push_str("\n[JVMUserOptions]\n");
    for (key, value) in USER_JVM_OPTIONS.fetch(params)?.unwrap_or_default() {
        let _ = writeln!(out, "{}={value}", key.replace('=', "\\="));
    }

    if app_cds {
        write_app_cds_sections(&mut out, params)?;
    }

    out.push_str("\n[ArgOptions]\n");
    for arg in ARGUMENTS.fetch(params)?.unwrap_or_default() {
        out.push_str(&escape_argument(&arg));
        out.push('\n');
    }

    Ok(out)
}

/// Renders and writes the config file to `path`.
pub async fn write_cfg(
    params: &mut ParamMap,
    path: &Path,
    runtime_location: &str,
    platform: Platform,
) -> Result<()> {
    let cfg = render_cfg(params, runtime_location, platform)?;
    fs::write_file(path, cfg).await?;
    log::debug!("Wrote launcher config {}", path.display());
    Ok(())
}

/// The launcher resolves `$CACHEDIR` and `$PACKAGEDIR` at run time.
fn write_app_cds_sections(out: &mut String, params: &mut ParamMap) -> Result<()> {
    let fs_name = APP_FS_NAME.require(params)?;
    let debug = VERBOSE.fetch(params)?.unwrap_or(false);
    let archive = format!("-XX:SharedArchiveFile=$CACHEDIR/{fs_name}.jpa");

    out.push_str("\n[AppCDSJVMOptions]\n");
    let _ = writeln!(out, "-XX:+UnlockCommercialFeatures\n{archive}\n-Xshare:auto\n-XX:+UseAppCDS");
    if debug {
        out.push_str("-verbose:class\n-XX:+TraceClassPaths\n-XX:+UnlockDiagnosticVMOptions\n");
    }

    out.push_str("\n[AppCDSGenerateCacheJVMOptions]\n");
    let _ = writeln!(out, "-XX:+UnlockCommercialFeatures\n-Xshare:dump\n-XX:+UseAppCDS\n{archive}");
    let _ = writeln!(out, "-XX:SharedClassListFile=$PACKAGEDIR/{fs_name}.classlist");
    if debug {
        out.push_str("-XX:+UnlockDiagnosticVMOptions\n");
    }
    Ok(())
}

/// Writes `<name.fs>.classlist` into `app_dir` when AppCDS is enabled: one
/// root class per line, in `com/example/Main` form.
pub async fn write_class_list(params: &mut ParamMap, app_dir: &Path) -> Result<()> {
    if !ENABLE_APP_CDS.fetch(params)?.unwrap_or(false) {
        return Ok(());
    }
    let fs_name = APP_FS_NAME.require(params)?;
    let classes: String = APP_CDS_CLASS_ROOTS
        .fetch(params)?
        .unwrap_or_default()
        .iter()
        .map(|class| format!("{}\n", class.replace('.', "/")))
        .collect();
    fs::write_file(&app_dir.join(format!("{fs_name}.classlist")), classes).await
}

fn line(out: &mut String, key: &str, value: &str) {
    let _ = writeln!(out, "{key}={value}");
}

fn join_classpath(classpath: &str, platform: Platform) -> String {
    classpath
        .split([' ', ':', ';'])
        .collect::<Vec<_>>()
        .join(&platform.path_separator().to_string())
}

// `name=` would read as an empty key/value pair, so the lone `=` is escaped.
fn escape_argument(arg: &str) -> String {
    match arg.strip_suffix('=') {
        Some(stem) if !stem.contains('=') => format!("{stem}\\="),
        _ => arg.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> ParamMap {
        let mut params = ParamMap::new();
        params.insert("name", "Hello World");
        params.insert("applicationClass", "com.example.Hello");
        params.insert("appVersion", "2.1");
        params.insert("classpath", "lib/a.jar lib/b.jar");
        params
    }

    #[test]
    fn application_section() {
        let mut params = base();
        let cfg = render_cfg(&mut params, "$APPDIR/runtime", Platform::Linux).unwrap();
        assert!(cfg.starts_with("[Application]\napp.name=Hello World\napp.version=2.1\n"));
        assert!(cfg.contains("app.preferences.id=com/example\n"));
        assert!(cfg.contains("app.runtime=$APPDIR/runtime\n"));
        assert!(cfg.contains("app.identifier=com.example\n"));
        assert!(cfg.contains("app.classpath=lib/a.jar:lib/b.jar\n"));
        assert!(cfg.contains("app.application.instance=multiple\n"));
        assert!(cfg.contains("app.mainclass=com/example/Hello\n"));
        assert!(!cfg.contains("app.mainmodule"));
    }

    #[test]
    fn app_cds_sections() {
        let mut params = base();
        params.insert("commercial.AppCDS", "true");
        params.insert("commercial.AppCDS.cache", "auto+install");
        let cfg = render_cfg(&mut params, "$APPDIR/runtime", Platform::Linux).unwrap();

        assert!(cfg.contains("app.application.instance=multiple\napp.appcds.cache=auto\n"));
        assert!(cfg.contains(
            "\n[AppCDSJVMOptions]\n-XX:+UnlockCommercialFeatures\n\
             -XX:SharedArchiveFile=$CACHEDIR/HelloWorld.jpa\n-Xshare:auto\n-XX:+UseAppCDS\n"
        ));
        assert!(cfg.contains(
            "\n[AppCDSGenerateCacheJVMOptions]\n-XX:+UnlockCommercialFeatures\n-Xshare:dump\n\
             -XX:+UseAppCDS\n-XX:SharedArchiveFile=$CACHEDIR/HelloWorld.jpa\n\
             -XX:SharedClassListFile=$PACKAGEDIR/HelloWorld.classlist\n\n[ArgOptions]\n"
        ));
        assert!(!cfg.contains("-verbose:class"));
    }

    #[test]
    fn app_cds_is_off_by_default() {
        let mut params = base();
        let cfg = render_cfg(&mut params, "", Platform::Linux).unwrap();
        assert!(!cfg.contains("appcds"));
        assert!(!cfg.contains("[AppCDS"));
    }

    #[tokio::test]
    async fn class_list_uses_slashed_root_classes() {
        let dir = tempfile::tempdir().unwrap();
        let mut params = base();
        write_class_list(&mut params, dir.path()).await.unwrap();
        assert!(!dir.path().join("HelloWorld.classlist").exists());

        params.insert("commercial.AppCDS", true);
        params.insert("commercial.AppCDS.classRoots", "com.example.Hello,com.example.Util");
        write_class_list(&mut params, dir.path()).await.unwrap();
        let list = std::fs::read_to_string(dir.path().join("HelloWorld.classlist")).unwrap();
        assert_eq!(list, "com/example/Hello\ncom/example/Util\n");
    }

    #[test]
    fn unknown_cache_mode_is_rejected() {
        let mut params = base();
        params.insert("commercial.AppCDS", "true");
        params.insert("commercial.AppCDS.cache", "sometimes");
        let err = render_cfg(&mut params, "", Platform::Linux).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn windows_classpath_separator() {
        let mut params = base();
        let cfg = render_cfg(&mut params, "$APPDIR\\runtime", Platform::Windows).unwrap();
        assert!(cfg.contains("app.classpath=lib/a.jar;lib/b.jar\n"));
    }

    #[test]
    fn module_replaces_main_class() {
        let mut params = base();
        params.insert("module", "hello/com.example.Hello");
        params.insert("singleton", "true");
        let cfg = render_cfg(&mut params, "", Platform::Linux).unwrap();
        assert!(cfg.contains("app.mainmodule=hello/com.example.Hello\n"));
        assert!(cfg.contains("app.application.instance=single\n"));
        assert!(!cfg.contains("app.mainclass"));
    }

    #[test]
    fn option_sections_and_escapes() {
        let mut params = base();
        params.insert("jvmOptions", "-Xss2m -ea");
        params.insert("jvmProperties", "log.level=FINE");
        params.insert("preloader", "com.example.Splash");
        params.insert("userJvmOptions", "-Xmx=1g\nweird\\=key=v");
        params.insert("arguments", vec!["--mode=".to_string(), "a=b=".into(), "plain".into()]);

        let cfg = render_cfg(&mut params, "", Platform::Linux).unwrap();
        assert!(cfg.contains(
            "\n\n[JVMOptions]\n-Xss2m\n-ea\n-Dlog.level=FINE\n-Djavafx.preloader=com.example.Splash\n"
        ));
        assert!(cfg.contains("\n\n[JVMUserOptions]\n-Xmx=1g\nweird\\=key=v\n"));
        assert!(cfg.ends_with("\n\n[ArgOptions]\n--mode\\=\na=b=\nplain\n"));
    }

    #[tokio::test]
    async fn cfg_is_written_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app/Hello.cfg");
        let mut params = base();
        write_cfg(&mut params, &path, "$APPDIR/runtime", Platform::Linux)
            .await
            .unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.contains("[ArgOptions]"));
    }
}
