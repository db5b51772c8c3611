//! `bundlers`: what this host can build.

use crate::bundler::{Bundler, Bundlers, Error, params::ParamMap};
use crate::cli::RuntimeConfig;
use crate::error::Result;

/// Bundlers that accept an empty configuration on this host, or fail only
/// on configuration.
pub fn usable(registry: &Bundlers) -> Vec<&dyn Bundler> {
    registry
        .all()
        .filter(|bundler| {
            let mut params = ParamMap::new();
            !matches!(bundler.validate(&mut params), Err(Error::UnsupportedPlatform))
        })
        .collect()
}

/// One listing line, with the description on its own tab-indented line
/// when verbose.
pub fn describe(bundler: &dyn Bundler, verbose: bool) -> String {
    let mut line = format!("{} - {} - {}", bundler.id(), bundler.name(), bundler.bundle_type());
    if verbose {
        line.push_str("\n\t");
        line.push_str(bundler.description());
    }
    line
}

/// Prints every bundler usable on this host.
pub fn list_bundlers(config: &RuntimeConfig) -> Result<i32> {
    let registry = Bundlers::new();
    let output = config.output();
    output.section("Installed Bundlers --")?;
    for bundler in usable(&registry) {
        output.info(&describe(bundler, config.is_verbose()))?;
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::{Platform, platform::linux::DebBundler, platform::windows::ExeBundler};

    #[test]
    fn foreign_bundlers_are_hidden() {
        let registry = Bundlers::with_bundlers(vec![
            Box::new(DebBundler::for_host(Platform::Linux)),
            Box::new(ExeBundler::for_host(Platform::Linux)),
        ]);
        let ids: Vec<_> = usable(&registry).iter().map(|b| b.id()).collect();
        assert_eq!(ids, vec!["deb"]);
    }

    #[test]
    fn verbose_line_adds_description() {
        let deb = DebBundler::for_host(Platform::Linux);
        assert_eq!(describe(&deb, false), "deb - Linux DEB Installer - INSTALLER");
        assert!(describe(&deb, true).starts_with("deb - Linux DEB Installer - INSTALLER\n\t"));
    }
}
