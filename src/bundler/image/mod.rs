//! Application image assembly shared by every platform.
//!
//! An image is the unpacked application: launcher(s), a launcher config file
//! per launcher, the application resources and optionally a runtime. The
//! platform bundlers decide where each piece goes; this module provides the
//! validation and the copy/render steps they share.

pub mod cfg;
pub mod launcher;

use crate::bundler::{
    Platform,
    error::{Error, Result},
    params::{ParamMap, standard::*},
    utils::fs,
};
use std::path::Path;

/// License file every usable runtime image carries.
pub const RUNTIME_MARKER: &str = "legal/java.base/LICENSE";

/// Fails with [`Error::UnsupportedPlatform`] unless `host` is `target`.
pub fn require_host(host: Platform, target: Platform) -> Result<()> {
    if host == target {
        Ok(())
    } else {
        Err(Error::UnsupportedPlatform)
    }
}

/// Checks the configured runtime, if any, looks like a runtime image.
pub fn validate_runtime(params: &mut ParamMap) -> Result<()> {
    if let Some(runtime) = RUNTIME.fetch(params)? {
        if !runtime.contains(RUNTIME_MARKER) {
            return Err(Error::config(
                format!(
                    "The Java runtime specified (\"{runtime}\") does not seem to be correct."
                ),
                "Either do not explicitly set the runtime or else specify an actual Java runtime.",
            ));
        }
    }
    Ok(())
}

/// Validation every image bundler runs: entry point and user JVM options.
pub fn validate_image(params: &mut ParamMap) -> Result<()> {
    validate_main_class_info(params)?;

    for (key, value) in USER_JVM_OPTIONS.fetch(params)?.unwrap_or_default() {
        if value.is_empty() {
            return Err(Error::config(
                format!("UserJvmOption key '{key}' has a null or empty value."),
                "Provide a value for the key or split the key into a key/value pair.  \
                 Such as '-Xmx1G' into '-Xmx' and '1G'.",
            ));
        }
    }

    let has_main_jar = MAIN_JAR.fetch(params)?.is_some();
    let has_module = MODULE.fetch(params)?.is_some();
    let has_main_class = MAIN_CLASS.fetch(params)?.is_some();
    if !has_main_jar && !has_module && !has_main_class {
        return Err(Error::config(
            "Main application class is missing.",
            "Please specify main application class.",
        ));
    }
    Ok(())
}

fn validate_main_class_info(params: &mut ParamMap) -> Result<()> {
    let has_main_class = MAIN_CLASS.is_set(params);
    let has_main_jar = MAIN_JAR.is_set(params);
    let has_class_path = CLASSPATH.is_set(params);
    let has_resources = APP_RESOURCES.is_set(params) || APP_RESOURCES_LIST.is_set(params);

    if (has_main_class && has_main_jar && has_class_path) || MODULE.is_set(params) {
        return Ok(());
    }
    if MAIN_CLASS.fetch(params)?.is_some() {
        return Ok(());
    }

    if has_main_jar {
        let jar = MAIN_JAR
            .fetch(params)?
            .map(|j| j.to_string())
            .unwrap_or_default();
        Err(Error::config(
            format!("An application class was not specified nor was one found in the jar {jar}"),
            format!(
                "Please specify a applicationClass or ensure that the jar {jar} specifies one in the manifest."
            ),
        ))
    } else if has_class_path {
        Err(Error::config(
            "An application class was not specified nor was one found in the supplied classpath",
            "Please specify a applicationClass or ensure that the classpath has a jar containing one in the manifest.",
        ))
    } else if has_resources {
        Err(Error::config(
            "An application class was not specified nor was one found in the supplied application resources",
            "Please specify a applicationClass or ensure that the appResources has a jar containing one in the manifest.",
        ))
    } else {
        // nothing to sniff; validate_image reports the missing entry point
        Ok(())
    }
}

/// Copies every application resource set into `app_dir`.
pub async fn copy_application(params: &mut ParamMap, app_dir: &Path) -> Result<()> {
    for set in APP_RESOURCES_LIST.fetch(params)?.unwrap_or_default() {
        log::debug!("Copying {set} to {}", app_dir.display());
        fs::copy_file_set(&set, app_dir).await?;
    }
    cfg::write_class_list(params, app_dir).await
}

/// Copies the configured runtime into `runtime_dir`. Returns whether one was copied.
pub async fn copy_runtime(params: &mut ParamMap, runtime_dir: &Path) -> Result<bool> {
    match RUNTIME.fetch(params)? {
        Some(runtime) => {
            log::debug!("Copying runtime {runtime} to {}", runtime_dir.display());
            fs::copy_file_set(&runtime, runtime_dir).await?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Parameter maps for each secondary launcher.
///
/// Each map is the base map overlaid with the launcher's own entries; the
/// file system name is dropped so it is derived again from the new name.
pub fn secondary_launchers(params: &mut ParamMap) -> Result<Vec<ParamMap>> {
    let base = params.clone();
    Ok(SECONDARY_LAUNCHERS
        .fetch(params)?
        .unwrap_or_default()
        .iter()
        .map(|entry| {
            let mut merged = base.clone();
            merged.extend(entry);
            merged.remove(APP_FS_NAME.id);
            merged
        })
        .collect())
}
