//! Resource templates with drop-in overrides.
//!
//! Every generated text resource (control files, desktop entries, Info.plist
//! fragments, installer scripts) has a built-in handlebars template. A file of
//! the same public name in the drop-in resources root replaces the built-in
//! template and is rendered with the same data.

use crate::bundler::error::{ErrorExt, Result};
use handlebars::Handlebars;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Renders a resource from its drop-in override or its built-in template.
///
/// # Arguments
///
/// * `public_name` - file name looked up in `dropin_root`, e.g. `control`
/// * `category` - human readable label used in log messages
/// * `default_template` - built-in handlebars source
/// * `data` - template data
/// * `dropin_root` - directory holding user overrides, if any
pub fn render<T: Serialize>(
    public_name: &str,
    category: &str,
    default_template: &str,
    data: &T,
    dropin_root: Option<&Path>,
) -> Result<String> {
    let source = match dropin_resource(public_name, dropin_root) {
        Some(path) => {
            log::info!("  Using custom package resource {category} ({public_name})");
            std::fs::read_to_string(&path).fs_context("reading drop-in resource", &path)?
        }
        None => {
            log::debug!("  Using default package resource {category} ({public_name})");
            default_template.to_string()
        }
    };

    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars
        .register_template_string(public_name, source)
        .map_err(Box::new)?;
    Ok(handlebars.render(public_name, data)?)
}

/// Picks a binary resource: the drop-in override when present, else `fallback`.
pub fn resource_file(
    public_name: &str,
    category: &str,
    fallback: Option<&Path>,
    dropin_root: Option<&Path>,
) -> Option<PathBuf> {
    if let Some(path) = dropin_resource(public_name, dropin_root) {
        log::info!("  Using custom package resource {category} ({public_name})");
        return Some(path);
    }
    fallback.map(Path::to_path_buf)
}

fn dropin_resource(public_name: &str, dropin_root: Option<&Path>) -> Option<PathBuf> {
    let candidate = dropin_root?.join(public_name);
    candidate.is_file().then_some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn built_in_template_renders_without_escaping() {
        let data = BTreeMap::from([("name", "Tom & Jerry")]);
        let out = render("t", "test", "Name={{name}}", &data, None).unwrap();
        assert_eq!(out, "Name=Tom & Jerry");
    }

    #[test]
    fn drop_in_file_overrides_template() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("control"), "Custom: {{name}}").unwrap();
        let data = BTreeMap::from([("name", "demo")]);

        let out = render("control", "DEB control file", "Package: {{name}}", &data, Some(dir.path()))
            .unwrap();
        assert_eq!(out, "Custom: demo");

        let icon = resource_file("demo.png", "icon", None, Some(dir.path()));
        assert!(icon.is_none());
    }
}
