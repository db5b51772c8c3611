//! `params`: the parameters one bundler accepts.

use crate::bundler::{Bundler, Bundlers};
use crate::cli::RuntimeConfig;
use crate::error::{CliError, Result};

/// Listing lines for the string-settable parameters of `bundler`.
pub fn describe_params(bundler: &dyn Bundler, verbose: bool) -> Vec<String> {
    bundler
        .params()
        .into_iter()
        .filter(|param| param.accepts_string())
        .map(|param| {
            let mut line = format!("{} - {} - {}", param.id(), param.name(), param.value_kind());
            if verbose {
                line.push_str("\n\t");
                line.push_str(param.description());
            }
            line
        })
        .collect()
}

/// Prints the parameters of the bundler with the given id.
pub fn list_params(id: &str, config: &RuntimeConfig) -> Result<i32> {
    let registry = Bundlers::new();
    let Some(bundler) = registry.find(id) else {
        return Err(CliError::UnknownBundler { id: id.to_string() }.into());
    };

    let output = config.output();
    output.section(&format!("Bundler Parameters for {} ({}) --", bundler.name(), bundler.id()))?;
    for line in describe_params(bundler, config.is_verbose()) {
        output.info(&line)?;
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::{Platform, platform::linux::RpmBundler};

    #[test]
    fn lists_string_params_with_kind() {
        let rpm = RpmBundler::for_host(Platform::Linux);
        let lines = describe_params(&rpm, false);
        assert!(lines.iter().any(|l| l.starts_with("linux.bundleName - ")));
        assert!(lines.iter().any(|l| l.starts_with("name - ")));
        assert!(lines.iter().all(|l| !l.contains('\n')));

        let verbose = describe_params(&rpm, true);
        assert!(verbose.iter().all(|l| l.contains("\n\t")));
    }
}
