//! Host platform detection and the per-platform bundlers.
//!
//! - [`linux`] - application image, `.deb` and `.rpm` installers
//! - [`macos`] - `.app` bundle, `.dmg` and `.pkg` installers
//! - [`windows`] - application image and Inno Setup `.exe` installer

pub mod linux;
pub mod macos;
pub mod windows;

use std::fmt;

/// Operating system family a bundler targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub enum Platform {
    /// Microsoft Windows.
    Windows,
    /// Linux distributions.
    Linux,
    /// macOS.
    Mac,
    /// Anything else.
    Unknown,
}

impl Platform {
    /// The platform this binary runs on.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "linux") {
            Platform::Linux
        } else if cfg!(target_os = "macos") {
            Platform::Mac
        } else {
            Platform::Unknown
        }
    }

    /// Separator used in class paths and search paths.
    pub fn path_separator(self) -> char {
        match self {
            Platform::Windows => ';',
            _ => ':',
        }
    }

    /// Host OS version as reported by the system, e.g. `14.5` or `22.04`.
    pub fn os_version() -> Option<String> {
        sysinfo::System::os_version()
    }

    /// Major component of [`Platform::os_version`].
    pub fn major_version() -> Option<u32> {
        Self::os_version().and_then(|v| v.split('.').next()?.trim().parse().ok())
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::Windows => "Windows",
            Platform::Linux => "Linux",
            Platform::Mac => "macOS",
            Platform::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separators_follow_platform() {
        assert_eq!(Platform::Windows.path_separator(), ';');
        assert_eq!(Platform::Linux.path_separator(), ':');
        assert_eq!(Platform::Mac.path_separator(), ':');
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn current_is_linux_on_linux() {
        assert_eq!(Platform::current(), Platform::Linux);
    }
}
