//! Application launchers.
//!
//! When the `launcher` parameter names a native executable it is copied into
//! the image. Otherwise a script launcher is generated: a POSIX shell script
//! on Linux and macOS, a batch file on Windows. Scripts locate the bundled
//! runtime relative to themselves and fall back to `java` on the `PATH`.

use crate::bundler::{
    Platform,
    error::Result,
    params::{ParamMap, standard::*},
    utils::{fs, template},
};
use serde::Serialize;
use std::path::{Path, PathBuf};

const SH_TEMPLATE: &str = r#"#!/bin/sh
# {{name}} {{version}}
APPDIR="$(cd "$(dirname "$0")" && pwd)"
JAVA="$APPDIR/{{runtime_dir}}/bin/java"
if [ ! -x "$JAVA" ]; then
  JAVA=java
fi
if [ $# -eq 0 ]; then
  set --{{#each arguments}} {{this}}{{/each}}
fi
exec "$JAVA"{{#each jvm_args}} {{this}}{{/each}} {{entry}} "$@"
"#;

const CMD_TEMPLATE: &str = r#"@echo off
rem {{name}} {{version}}
setlocal
set "APPDIR=%~dp0"
set "JAVA=%APPDIR%{{runtime_dir}}\bin\java.exe"
if not exist "%JAVA%" set "JAVA=java"
if "%~1"=="" (
  "%JAVA%"{{#each jvm_args}} {{this}}{{/each}} {{entry}}{{#each arguments}} {{this}}{{/each}}
) else (
  "%JAVA%"{{#each jvm_args}} {{this}}{{/each}} {{entry}} %*
)
"#;

/// Where the launcher finds the application and runtime, relative to itself.
#[derive(Debug, Clone, Copy)]
pub struct LauncherLayout {
    /// Directory holding the application resources, e.g. `app`.
    pub app_dir: &'static str,
    /// Runtime home, e.g. `runtime`.
    pub runtime_dir: &'static str,
}

impl LauncherLayout {
    /// `<fs>/{launcher, app/, runtime/}`, used by the Linux and Windows images.
    pub const FLAT: LauncherLayout = LauncherLayout {
        app_dir: "app",
        runtime_dir: "runtime",
    };

    /// Launcher in `Contents/MacOS` of an `.app` bundle.
    pub const MAC_BUNDLE: LauncherLayout = LauncherLayout {
        app_dir: "../Java",
        runtime_dir: "../PlugIns/Java.runtime/Contents/Home",
    };
}

#[derive(Serialize)]
struct ScriptData {
    name: String,
    version: String,
    runtime_dir: String,
    jvm_args: Vec<String>,
    entry: String,
    arguments: Vec<String>,
}

/// File name of the launcher for `fs_name` on `platform`.
pub fn launcher_name(fs_name: &str, platform: Platform, native: bool) -> String {
    match (platform, native) {
        (Platform::Windows, true) => format!("{fs_name}.exe"),
        (Platform::Windows, false) => format!("{fs_name}.cmd"),
        _ => fs_name.to_string(),
    }
}

/// Installs the launcher for `params` into `dir` and returns its path.
///
/// # Arguments
///
/// * `params` - parameters of the launcher being written
/// * `dir` - directory the launcher is placed in
/// * `layout` - app and runtime locations relative to `dir`
/// * `platform` - target platform, decides script flavor and file name
pub async fn write_launcher(
    params: &mut ParamMap,
    dir: &Path,
    layout: LauncherLayout,
    platform: Platform,
) -> Result<PathBuf> {
    let fs_name = APP_FS_NAME.require(params)?;

    if let Some(native) = LAUNCHER.fetch(params)? {
        let dest = dir.join(launcher_name(&fs_name, platform, true));
        fs::copy_file(&native, &dest).await?;
        fs::set_executable(&dest).await?;
        log::debug!("Copied launcher {} to {}", native.display(), dest.display());
        return Ok(dest);
    }

    let dest = dir.join(launcher_name(&fs_name, platform, false));
    let script = render_script(params, layout, platform)?;
    fs::write_file(&dest, script).await?;
    fs::set_executable(&dest).await?;
    log::debug!("Generated launcher script {}", dest.display());
    Ok(dest)
}

/// Renders the script launcher source.
pub fn render_script(
    params: &mut ParamMap,
    layout: LauncherLayout,
    platform: Platform,
) -> Result<String> {
    let windows = platform == Platform::Windows;
    let quote: fn(&str) -> String = if windows { cmd_quote } else { sh_quote };
    let app_prefix = if windows {
        format!("%APPDIR%{}\\", layout.app_dir.replace('/', "\\"))
    } else {
        format!("$APPDIR/{}/", layout.app_dir)
    };

    let mut jvm_args: Vec<String> = JVM_OPTIONS
        .fetch(params)?
        .unwrap_or_default()
        .iter()
        .map(|o| quote(o))
        .collect();
    for (key, value) in JVM_PROPERTIES.fetch(params)?.unwrap_or_default() {
        jvm_args.push(quote(&format!("-D{key}={value}")));
    }
    if let Some(preloader) = PRELOADER.fetch(params)? {
        jvm_args.push(quote(&format!("-Djavafx.preloader={preloader}")));
    }
    for (key, value) in USER_JVM_OPTIONS.fetch(params)?.unwrap_or_default() {
        jvm_args.push(quote(&format!("{key}{value}")));
    }

    let entry = match MODULE.fetch(params)? {
        Some(module) => format!("-p \"{app_prefix}\" -m {}", quote(&module)),
        None => {
            let mut entries: Vec<String> = Vec::new();
            if let Some(jar) = MAIN_JAR.fetch(params)? {
                entries.extend(jar.included_files().map(str::to_string));
            }
            entries.extend(
                CLASSPATH
                    .fetch(params)?
                    .unwrap_or_default()
                    .split([' ', ':', ';'])
                    .filter(|e| !e.is_empty())
                    .map(str::to_string),
            );
            // the prefix must stay expandable, so only the entries are quoted
            let classpath = if windows {
                let joined = entries
                    .iter()
                    .map(|e| format!("{app_prefix}{}", cmd_escape(&e.replace('/', "\\"))))
                    .collect::<Vec<_>>()
                    .join(";");
                format!("\"{joined}\"")
            } else {
                entries
                    .iter()
                    .map(|e| format!("\"{app_prefix}\"{}", sh_quote(e)))
                    .collect::<Vec<_>>()
                    .join(":")
            };
            let main_class = MAIN_CLASS.fetch(params)?.unwrap_or_default();
            format!("-cp {classpath} {}", quote(&main_class))
        }
    };

    let data = ScriptData {
        name: APP_NAME.fetch(params)?.unwrap_or_default(),
        version: VERSION.fetch(params)?.unwrap_or_default(),
        runtime_dir: if windows {
            layout.runtime_dir.replace('/', "\\")
        } else {
            layout.runtime_dir.to_string()
        },
        jvm_args,
        entry,
        arguments: ARGUMENTS
            .fetch(params)?
            .unwrap_or_default()
            .iter()
            .map(|a| quote(a))
            .collect(),
    };

    let dropin = DROP_IN_RESOURCES_ROOT.fetch(params)?;
    let (public_name, source) = if windows {
        ("launcher.cmd", CMD_TEMPLATE)
    } else {
        ("launcher.sh", SH_TEMPLATE)
    };
    let script = template::render(public_name, "launcher script", source, &data, dropin.as_deref())?;
    Ok(if windows { script.replace('\n', "\r\n") } else { script })
}

fn sh_quote(s: &str) -> String {
    let safe = !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || "_@%+=:,./-".contains(c));
    if safe {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r#"'"'"'"#))
    }
}

fn cmd_quote(s: &str) -> String {
    if !s.is_empty() && !s.contains([' ', '\t', '&', '|', '<', '>', '^', '"']) {
        cmd_escape(s)
    } else {
        format!("\"{}\"", cmd_escape(s))
    }
}

// Text placed inside a double-quoted batch argument.
fn cmd_escape(s: &str) -> String {
    s.replace('%', "%%").replace('"', "\"\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ParamMap {
        let mut params = ParamMap::new();
        params.insert("name", "Hello");
        params.insert("applicationClass", "com.example.Hello");
        params.insert("classpath", "lib/dep.jar");
        params.insert("jvmOptions", "-Xss2m");
        params.insert("userJvmOptions", "-Xmx=512m");
        params.insert("arguments", "--greeting \"hi there\"");
        params.insert_null("dropinResourcesRoot");
        params
    }

    #[test]
    fn shell_script_uses_bundled_runtime() {
        let mut params = params();
        let script = render_script(&mut params, LauncherLayout::FLAT, Platform::Linux).unwrap();
        assert!(script.starts_with("#!/bin/sh\n"));
        assert!(script.contains("JAVA=\"$APPDIR/runtime/bin/java\""));
        assert!(script.contains("set -- --greeting 'hi there'\n"));
        assert!(script.contains(
            "exec \"$JAVA\" -Xss2m -Xmx512m -cp \"$APPDIR/app/\"lib/dep.jar com.example.Hello \"$@\""
        ));
    }

    #[test]
    fn module_launch() {
        let mut params = params();
        params.insert("module", "hello/com.example.Hello");
        let script =
            render_script(&mut params, LauncherLayout::MAC_BUNDLE, Platform::Mac).unwrap();
        assert!(script.contains("$APPDIR/../PlugIns/Java.runtime/Contents/Home/bin/java"));
        assert!(script.contains("-p \"$APPDIR/../Java/\" -m hello/com.example.Hello"));
    }

    #[test]
    fn batch_script_for_windows() {
        let mut params = params();
        let script =
            render_script(&mut params, LauncherLayout::FLAT, Platform::Windows).unwrap();
        assert!(script.starts_with("@echo off\r\n"));
        assert!(script.contains("%APPDIR%runtime\\bin\\java.exe"));
        assert!(script.contains("-cp \"%APPDIR%app\\lib\\dep.jar\" com.example.Hello --greeting \"hi there\""));
    }

    #[test]
    fn quoting() {
        assert_eq!(sh_quote("-Dx=1"), "-Dx=1");
        assert_eq!(sh_quote("it's"), r#"'it'"'"'s'"#);
        assert_eq!(sh_quote(""), "''");
        assert_eq!(cmd_quote("a b"), "\"a b\"");
        assert_eq!(cmd_quote("50%"), "50%%");
    }

    #[test]
    fn classpath_entries_are_quoted() {
        let mut params = params();
        params.insert("classpath", "lib/$HOME`id`.jar lib/a\"b.jar");
        let script = render_script(&mut params, LauncherLayout::FLAT, Platform::Linux).unwrap();
        assert!(script.contains(
            "-cp \"$APPDIR/app/\"'lib/$HOME`id`.jar':\"$APPDIR/app/\"'lib/a\"b.jar' com.example.Hello"
        ));

        params.insert("classpath", "lib/100%.jar");
        let script =
            render_script(&mut params, LauncherLayout::FLAT, Platform::Windows).unwrap();
        assert!(script.contains("-cp \"%APPDIR%app\\lib\\100%%.jar\" com.example.Hello"));
    }

    #[tokio::test]
    async fn script_is_written_executable() {
        let dir = tempfile::tempdir().unwrap();
        let mut params = params();
        let path = write_launcher(&mut params, dir.path(), LauncherLayout::FLAT, Platform::Linux)
            .await
            .unwrap();
        assert_eq!(path, dir.path().join("Hello"));
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o111, 0o111);
        }
    }

    #[tokio::test]
    async fn native_launcher_is_copied() {
        let dir = tempfile::tempdir().unwrap();
        let native = dir.path().join("stub");
        std::fs::write(&native, b"\x7fELF").unwrap();
        let out = dir.path().join("image");
        let mut params = params();
        params.insert("launcher", native);
        let path = write_launcher(&mut params, &out, LauncherLayout::FLAT, Platform::Windows)
            .await
            .unwrap();
        assert_eq!(path, out.join("Hello.exe"));
        assert_eq!(std::fs::read(path).unwrap(), b"\x7fELF");
    }
}
