//! Parameter sources besides the command line flags.
//!
//! - TOML config files (`--config`): top-level keys are parameter ids,
//!   nested tables flatten to dotted ids (`[mac] CFBundleName` becomes
//!   `mac.CFBundleName`) and arrays of tables become lists of parameter maps
//!   (`[[secondaryLaunchers]]`, `[[fileAssociations]]`).
//! - Properties files (`--param-file`).
//! - `-B key=value` bundle arguments.
//!
//! Every string is stored unparsed; the parameter's own parser converts it
//! on first use. The literal `null` stores an explicit null.

use crate::bundler::params::{ParamMap, ParamValue, RelativeFileSet, parse::parse_properties};
use crate::error::{BundlerError, CliError, Result};
use anyhow::Context;
use std::path::Path;

/// Loads a TOML config file into a parameter map.
pub fn load_toml(path: &Path) -> Result<ParamMap> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    let table: toml::Table = toml::from_str(&text)?;
    let mut params = ParamMap::new();
    flatten_table("", &table, &mut params)?;
    log::debug!("Loaded {} parameters from {}", params.len(), path.display());
    Ok(params)
}

/// Loads a properties file into a parameter map.
pub fn load_properties(path: &Path) -> Result<ParamMap> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading parameter file {}", path.display()))?;
    let params: ParamMap = parse_properties(&text)
        .into_iter()
        .map(|(key, value)| (key, user_value(&value)))
        .collect();
    log::debug!("Loaded {} parameters from {}", params.len(), path.display());
    Ok(params)
}

/// Splits a `-B` argument into key and value. A bare key means `true`;
/// an empty key is ignored.
pub fn parse_bundle_argument(arg: &str) -> Option<(String, ParamValue)> {
    let (key, value) = match arg.split_once('=') {
        Some((key, value)) => (key, user_value(value)),
        None => (arg, ParamValue::Raw("true".into())),
    };
    if key.is_empty() {
        log::warn!("Ignoring bundle argument without a key: -B{arg}");
        return None;
    }
    Some((key.to_string(), value))
}

/// Wraps a user supplied string; `null` (any case) is an explicit null.
pub fn user_value(value: &str) -> ParamValue {
    if value.trim().eq_ignore_ascii_case("null") {
        ParamValue::Null
    } else {
        ParamValue::Raw(value.to_string())
    }
}

/// The application resources named by `--srcdir` and `--srcfiles`.
///
/// `srcfiles` is a path-separator delimited list relative to `srcdir`;
/// directories contribute every file below them. Without it every file
/// below `srcdir` is included.
pub fn source_files(srcdir: &Path, srcfiles: Option<&str>) -> Result<RelativeFileSet> {
    if !srcdir.is_dir() {
        return Err(CliError::InvalidArguments {
            reason: format!(
                "Unable to add resources: \"--srcdir\" is not a directory but was: {}",
                srcdir.display()
            ),
        }
        .into());
    }
    let Some(srcfiles) = srcfiles else {
        return Ok(RelativeFileSet::from_dir(srcdir)?);
    };

    let separator = if cfg!(windows) { ';' } else { ':' };
    let mut files = Vec::new();
    for name in srcfiles.split(separator).filter(|n| !n.is_empty()) {
        let path = srcdir.join(name);
        if path.is_dir() {
            let nested = RelativeFileSet::from_dir(&path)?;
            files.extend(nested.included_files().map(|f| format!("{name}/{f}")));
        } else if path.is_file() {
            files.push(name.to_string());
        } else {
            return Err(CliError::InvalidArguments {
                reason: format!("Source file {} does not exist", path.display()),
            }
            .into());
        }
    }
    Ok(RelativeFileSet::new(srcdir, files)?)
}

fn flatten_table(prefix: &str, table: &toml::Table, params: &mut ParamMap) -> Result<()> {
    for (key, value) in table {
        let id = format!("{prefix}{key}");
        match value {
            toml::Value::Table(nested) => flatten_table(&format!("{id}."), nested, params)?,
            toml::Value::Array(items) => {
                params.insert(id.clone(), array_value(&id, items)?);
            }
            scalar => {
                params.insert(id, scalar_value(scalar));
            }
        }
    }
    Ok(())
}

fn array_value(id: &str, items: &[toml::Value]) -> Result<ParamValue> {
    if items.iter().all(toml::Value::is_table) && !items.is_empty() {
        let mut maps = Vec::with_capacity(items.len());
        for item in items {
            let mut map = ParamMap::new();
            if let toml::Value::Table(table) = item {
                flatten_table("", table, &mut map)?;
            }
            maps.push(map);
        }
        return Ok(ParamValue::Maps(maps));
    }
    if items.iter().any(|i| i.is_table() || i.is_array()) {
        return Err(BundlerError::Cli(CliError::InvalidArguments {
            reason: format!("'{id}' must be an array of values or an array of tables"),
        }));
    }
    Ok(ParamValue::List(
        items
            .iter()
            .map(|item| match item {
                toml::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
    ))
}

fn scalar_value(value: &toml::Value) -> ParamValue {
    match value {
        toml::Value::String(s) => user_value(s),
        toml::Value::Boolean(b) => ParamValue::Bool(*b),
        other => ParamValue::Raw(other.to_string()),
    }
}
