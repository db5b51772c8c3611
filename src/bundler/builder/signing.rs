//! macOS code signing: certificate lookup and `codesign`.
//!
//! Signing identities are looked up in the keychain by common name, e.g.
//! `Developer ID Application: Jane Doe`. An ambiguous lookup yields no key
//! so that the wrong certificate is never picked silently.

use crate::bundler::{Result, utils::process};
use std::{path::Path, process::Command};

/// Common-name prefix of application signing certificates.
pub const DEVELOPER_ID_APP_PREFIX: &str = "Developer ID Application: ";

/// Common-name prefix of installer signing certificates.
pub const DEVELOPER_ID_INSTALLER_PREFIX: &str = "Developer ID Installer: ";

/// Finds the unique certificate whose common name contains `key`.
///
/// Runs `security find-certificate -c <key> -a [keychain]` and reads the
/// certificate alias from its output. Returns `None` when the tool is
/// unavailable, nothing matches or more than one certificate matches.
pub fn find_signing_key(key: &str, keychain: Option<&str>) -> Option<String> {
    if !cfg!(target_os = "macos") {
        return None;
    }

    let mut command = Command::new("security");
    command.args(["find-certificate", "-c", key, "-a"]);
    if let Some(keychain) = keychain.filter(|k| !k.is_empty()) {
        command.arg(keychain);
    }

    let output = match command.output() {
        Ok(output) => output,
        Err(e) => {
            log::debug!("security find-certificate failed: {e}");
            return None;
        }
    };
    parse_certificate_alias(&String::from_utf8_lossy(&output.stdout), key)
}

/// Extracts the single `"alis"<blob>="..."` value from `security` output.
pub fn parse_certificate_alias(output: &str, key: &str) -> Option<String> {
    let re = regex::Regex::new(r#""alis"<blob>="([^"]+)""#).ok()?;
    let mut matches = re.captures_iter(output).filter_map(|c| c.get(1));

    let Some(found) = matches.next() else {
        log::info!("Did not find a key matching '{key}'");
        return None;
    };
    if matches.next().is_some() {
        log::info!("Found more than one key matching '{key}'");
        return None;
    }
    log::debug!("Using key '{}'", found.as_str());
    Some(found.as_str().to_string())
}

/// Signs an application bundle (or any file) with `identity`.
///
/// The ad-hoc identity `-` is passed through unchanged.
pub async fn codesign(path: &Path, identity: &str, keychain: Option<&str>) -> Result<()> {
    log::info!("Signing {} with '{}'", path.display(), identity);

    let mut command = tokio::process::Command::new("codesign");
    command.args(["--force", "--deep", "--timestamp", "--options", "runtime", "-s", identity]);
    if let Some(keychain) = keychain.filter(|k| !k.is_empty()) {
        command.args(["--keychain", keychain]);
    }
    command.arg(path);
    process::run(&mut command).await?;

    log::info!("✓ Signed {}", path.display());
    Ok(())
}
