//! Inno Setup helpers: value quoting, version formatting and architecture mapping.

use crate::bundler::error::{Error, Result};

/// Inno Setup limits `AppId` to 126 characters.
const MAX_APP_ID: usize = 126;

/// Quotes `value` when Inno Setup would otherwise misread it.
///
/// Values containing `"` or with leading/trailing whitespace are wrapped in
/// quotes with embedded quotes doubled; everything else is used as is.
pub fn innosetup_escape(value: &str) -> String {
    if value.contains('"') || value.trim() != value {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Wraps `value` in quotes, doubling embedded quotes.
pub fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// `AppId` derived from the identifier, truncated to the Inno Setup limit.
pub fn app_identifier(identifier: &str) -> String {
    identifier.chars().take(MAX_APP_ID).collect()
}

/// Formats a version for `VersionInfoVersion`, which takes exactly four
/// numeric parts.
///
/// - "1" -> "1.0.0.0"
/// - "1.2.3" -> "1.2.3.0"
/// - "1.2.3.4.5" -> "1.2.3.4"
/// - "2.0-beta" -> "2.0.0.0"
pub fn format_version_info(version: &str) -> String {
    let mut parts: Vec<u32> = version
        .split('.')
        .take(4)
        .map(|part| {
            let digits: String = part.chars().take_while(char::is_ascii_digit).collect();
            digits.parse().unwrap_or(0)
        })
        .collect();
    parts.resize(4, 0);
    parts
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

/// Maps a Rust target architecture to an Inno Setup architecture identifier.
///
/// 32-bit x86 installs in the default mode and maps to an empty string.
pub fn map_arch(arch: &str) -> Result<&'static str> {
    match arch {
        "x86_64" => Ok("x64"),
        "aarch64" => Ok("arm64"),
        "x86" => Ok(""),
        _ => Err(Error::ArchError(format!(
            "Unsupported architecture for Inno Setup: {arch}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escaping_only_when_needed() {
        assert_eq!(innosetup_escape("Acme"), "Acme");
        assert_eq!(innosetup_escape("Say \"hi\""), "\"Say \"\"hi\"\"\"");
        assert_eq!(innosetup_escape(" padded"), "\" padded\"");
    }

    #[test]
    fn version_info_has_four_numeric_parts() {
        assert_eq!(format_version_info("1"), "1.0.0.0");
        assert_eq!(format_version_info("1.2.3"), "1.2.3.0");
        assert_eq!(format_version_info("1.2.3.4.5"), "1.2.3.4");
        assert_eq!(format_version_info("2.0-beta"), "2.0.0.0");
    }

    #[test]
    fn app_id_is_truncated() {
        let long = "a".repeat(200);
        assert_eq!(app_identifier(&long).len(), 126);
        assert_eq!(app_identifier("com.example"), "com.example");
    }

    #[test]
    fn arch_mapping() {
        assert_eq!(map_arch("x86_64").unwrap(), "x64");
        assert_eq!(map_arch("x86").unwrap(), "");
        assert!(matches!(map_arch("riscv64"), Err(Error::ArchError(_))));
    }
}
