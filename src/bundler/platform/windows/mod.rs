//! Windows bundlers: application image and Inno Setup installer.
//!
//! - `app` - the `windows.app` image
//! - `exe` - the `.exe` installer built with `iscc`

mod app;
mod exe;

pub use app::WinAppBundler;
pub use exe::ExeBundler;

use crate::bundler::params::{BundlerParam, standard::*};
use std::{marker::PhantomData, path::PathBuf};

/// The application icon when it is an ICO file; other formats are ignored.
pub static ICON_ICO: BundlerParam<PathBuf> = BundlerParam {
    id: "icon.ico",
    name: ".ico Icon",
    description: "Icon for the application, in ICO format.",
    default: |p| {
        Ok(ICON.fetch(p)?.filter(|icon| {
            let ico = icon
                .extension()
                .is_some_and(|e| e.eq_ignore_ascii_case("ico"));
            if !ico {
                log::info!(
                    "The specified icon \"{}\" is not an ICO file and will not be used.",
                    icon.display()
                );
            }
            ico
        }))
    },
    parser: Some(|s, _| Ok(Some(PathBuf::from(s)))),
    kind: PhantomData,
};

/// Device names Windows refuses as file names, with or without extension.
const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Whether `name` is a reserved device name such as `CON` or `com1`.
fn is_reserved_name(name: &str) -> bool {
    let stem = name.split('.').next().unwrap_or(name).trim_end();
    RESERVED_NAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(stem))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::params::ParamMap;

    #[test]
    fn reserved_names_ignore_case_and_extension() {
        assert!(is_reserved_name("CON"));
        assert!(is_reserved_name("nul"));
        assert!(is_reserved_name("Com3.exe"));
        assert!(!is_reserved_name("Console"));
        assert!(!is_reserved_name("COM10"));
    }

    #[test]
    fn non_ico_icon_is_dropped() {
        let mut params = ParamMap::new();
        params.insert("icon", "art/app.png");
        assert_eq!(ICON_ICO.fetch(&mut params).unwrap(), None);

        let mut params = ParamMap::new();
        params.insert("icon", "art/app.ico");
        assert_eq!(ICON_ICO.fetch(&mut params).unwrap(), Some(PathBuf::from("art/app.ico")));
    }
}
