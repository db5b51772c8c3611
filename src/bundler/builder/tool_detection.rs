//! External tool detection and availability checking.
//!
//! Each probe runs at most once per process; results are cached in
//! [`LazyLock`]s so validating several bundlers does not re-spawn tools.

use std::{path::PathBuf, process::Command, sync::LazyLock};

/// `dpkg-deb`, used to build `.deb` packages.
pub static HAS_DPKG_DEB: LazyLock<bool> = LazyLock::new(|| probe("dpkg-deb", "--version"));

/// `fakeroot`, used to give `.deb` payloads root ownership.
pub static HAS_FAKEROOT: LazyLock<bool> = LazyLock::new(|| probe("fakeroot", "--version"));

/// `rpmbuild`, used to build `.rpm` packages.
pub static HAS_RPMBUILD: LazyLock<bool> = LazyLock::new(|| probe("rpmbuild", "--version"));

/// `hdiutil`, used to build disk images.
pub static HAS_HDIUTIL: LazyLock<bool> = LazyLock::new(|| locate("hdiutil").is_some());

/// `pkgbuild` and `productbuild`, used to build flat installer packages.
pub static HAS_PKGBUILD: LazyLock<bool> =
    LazyLock::new(|| locate("pkgbuild").is_some() && locate("productbuild").is_some());

/// `codesign`, used to sign application bundles.
pub static HAS_CODESIGN: LazyLock<bool> = LazyLock::new(|| locate("codesign").is_some());

/// Inno Setup compiler location and version, e.g. `("C:\\...\\iscc.exe", "6.2")`.
pub static INNO_SETUP: LazyLock<Option<(PathBuf, String)>> = LazyLock::new(|| {
    let path = locate("iscc")?;
    // iscc prints its banner and exits non-zero for /?
    match Command::new(&path).arg("/?").output() {
        Ok(output) => {
            let text = String::from_utf8_lossy(&output.stdout);
            match inno_setup_version(&text) {
                Some(version) => {
                    log::debug!("✓ Inno Setup {version} at {}", path.display());
                    Some((path, version))
                }
                None => {
                    log::warn!(
                        "{} did not report an Inno Setup version. EXE installers will be skipped.",
                        path.display()
                    );
                    None
                }
            }
        }
        Err(e) => {
            log::warn!(
                "iscc found at {} but failed to execute: {}. Check file permissions.",
                path.display(),
                e
            );
            None
        }
    }
});

/// Extracts the version from an Inno Setup banner such as
/// `Inno Setup 6 Command-Line Compiler` or `Inno Setup 5.5.9 (u)`.
pub fn inno_setup_version(banner: &str) -> Option<String> {
    let re = regex::Regex::new(r"Inno Setup (\d+\.?\d*)").ok()?;
    Some(re.captures(banner)?.get(1)?.as_str().to_string())
}

/// Major component of an Inno Setup version string.
pub fn inno_setup_major(version: &str) -> Option<u32> {
    version.split('.').next()?.parse().ok()
}

fn locate(tool: &str) -> Option<PathBuf> {
    match which::which(tool) {
        Ok(path) => {
            log::debug!("Found {} at: {}", tool, path.display());
            Some(path)
        }
        Err(e) => {
            log::debug!("{tool} not found in PATH: {e}");
            None
        }
    }
}

fn probe(tool: &str, version_arg: &str) -> bool {
    let Some(path) = locate(tool) else {
        return false;
    };
    match Command::new(&path).arg(version_arg).output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout);
            log::debug!(
                "✓ {} available: {}",
                tool,
                version.lines().next().unwrap_or_default().trim()
            );
            true
        }
        Ok(output) => {
            log::warn!(
                "{} found at {} but {} check failed (exit code: {:?}). Stderr: {}",
                tool,
                path.display(),
                version_arg,
                output.status.code(),
                String::from_utf8_lossy(&output.stderr)
            );
            false
        }
        Err(e) => {
            log::warn!(
                "{} found at {} but failed to execute: {}. Check file permissions.",
                tool,
                path.display(),
                e
            );
            false
        }
    }
}
