//! `deploy`: collect parameters from every source and run the bundlers.

use crate::bundler::{BundleRequest, BundledArtifact, Bundlers, params::ParamMap};
use crate::cli::{DeployArgs, RuntimeConfig};
use crate::config;
use crate::error::Result;
use anyhow::Context;
use path_absolutize::Absolutize;
use std::path::Path;

/// Builds the parameter map for a deploy run.
///
/// Later sources override earlier ones: `--config`, then `--param-file`,
/// then the dedicated flags, then `-B` arguments.
pub fn deploy_params(args: &DeployArgs) -> Result<ParamMap> {
    let mut params = ParamMap::new();

    if let Some(path) = &args.config {
        params.extend(&config::load_toml(path)?);
    }
    if let Some(path) = &args.param_file {
        params.extend(&config::load_properties(path)?);
    }

    let text_flags = [
        ("name", &args.name),
        ("applicationClass", &args.appclass),
        ("vendor", &args.vendor),
        ("title", &args.title),
        ("description", &args.description),
        ("preloader", &args.preloader),
    ];
    for (key, value) in text_flags {
        if let Some(value) = value {
            params.insert(key, config::user_value(value));
        }
    }
    if !args.arguments.is_empty() {
        params.insert("arguments", args.arguments.clone());
    }
    if args.nosign {
        params.insert("signBundle", false);
    }
    let switches = [
        ("serviceHint", args.daemon),
        ("singleton", args.singleton),
        ("installdirChooser", args.installdir_chooser),
        ("verbose", args.verbose),
    ];
    for (key, on) in switches {
        if on {
            params.insert(key, true);
        }
    }

    if let Some(srcdir) = &args.srcdir {
        let srcdir = srcdir
            .absolutize()
            .with_context(|| format!("resolving {}", srcdir.display()))?
            .into_owned();
        let resources = config::source_files(&srcdir, args.srcfiles.as_deref())?;
        params.insert("srcdir", srcdir.display().to_string());
        params.insert("appResources", resources);
    }

    for arg in &args.bundle_args {
        if let Some((key, value)) = config::parse_bundle_argument(arg) {
            params.insert(key, value);
        }
    }

    Ok(params)
}

/// Runs the requested bundlers and reports what they produced.
pub async fn deploy(args: &DeployArgs, config: &RuntimeConfig) -> Result<i32> {
    let output = config.output();
    let request = match args.native.as_deref() {
        Some(value) => BundleRequest::parse(value),
        None => BundleRequest::None,
    };
    if request == BundleRequest::None {
        output.warn("No bundles requested; pass --native to build images or installers.")?;
        return Ok(0);
    }

    let params = deploy_params(args)?;
    log::debug!("Deploy parameters: {:?}", params.keys());

    let outdir = args
        .outdir
        .absolutize()
        .with_context(|| format!("resolving {}", args.outdir.display()))?
        .into_owned();

    output.progress(&format!("Bundling into {}", outdir.display()))?;
    let artifacts = Bundlers::new().generate(&params, &outdir, &request).await?;

    if artifacts.is_empty() {
        output.warn("No bundler produced an artifact on this host.")?;
    }
    for artifact in &artifacts {
        output.success(&format!("{} ({})", artifact.path.display(), artifact.bundler))?;
        output.indent(&format!("{} bytes, sha256 {}", artifact.size, artifact.checksum))?;
    }

    if let Some(report) = &args.report {
        write_report(report, &artifacts)?;
        config.verbose_println(&format!("Wrote report to {}", report.display()))?;
    }
    Ok(0)
}

fn write_report(path: &Path, artifacts: &[BundledArtifact]) -> Result<()> {
    let json = serde_json::to_string_pretty(artifacts)?;
    std::fs::write(path, json)
        .with_context(|| format!("writing report {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::params::{
        ParamValue,
        standard::{APP_RESOURCES, ARGUMENTS, MAIN_CLASS, SERVICE_HINT, SIGN_BUNDLE},
    };

    fn args(outdir: &Path) -> DeployArgs {
        DeployArgs {
            outdir: outdir.to_path_buf(),
            ..Default::default()
        }
    }

    #[test]
    fn flags_map_to_params() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hello.jar"), b"jar").unwrap();

        let mut deploy = args(dir.path());
        deploy.name = Some("Hello".into());
        deploy.appclass = Some("com.example.Hello".into());
        deploy.arguments = vec!["--fast".into()];
        deploy.nosign = true;
        deploy.daemon = true;
        deploy.srcdir = Some(dir.path().to_path_buf());

        let mut params = deploy_params(&deploy).unwrap();
        assert_eq!(MAIN_CLASS.require(&mut params).unwrap(), "com.example.Hello");
        assert_eq!(ARGUMENTS.require(&mut params).unwrap(), vec!["--fast"]);
        assert_eq!(SIGN_BUNDLE.fetch(&mut params).unwrap(), Some(false));
        assert_eq!(SERVICE_HINT.fetch(&mut params).unwrap(), Some(true));
        assert!(APP_RESOURCES.require(&mut params).unwrap().contains("hello.jar"));
        assert!(!params.contains_key("singleton"));
    }

    #[test]
    fn later_sources_override_earlier_ones() {
        let dir = tempfile::tempdir().unwrap();
        let toml = dir.path().join("app.toml");
        std::fs::write(&toml, "name = \"FromToml\"\nvendor = \"Acme\"\ntitle = \"T\"\n").unwrap();
        let props = dir.path().join("app.properties");
        std::fs::write(&props, "name=FromProps\ntitle=P\n").unwrap();

        let mut deploy = args(dir.path());
        deploy.config = Some(toml);
        deploy.param_file = Some(props);
        deploy.title = Some("FromFlag".into());
        deploy.bundle_args = vec!["name=FromB".into(), "signBundle".into()];

        let params = deploy_params(&deploy).unwrap();
        assert_eq!(params.get("name"), Some(&ParamValue::Raw("FromB".into())));
        assert_eq!(params.get("title"), Some(&ParamValue::Raw("FromFlag".into())));
        assert_eq!(params.get("vendor"), Some(&ParamValue::Raw("Acme".into())));
        assert_eq!(params.get("signBundle"), Some(&ParamValue::Raw("true".into())));
    }

    #[test]
    fn missing_srcdir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut deploy = args(dir.path());
        deploy.srcdir = Some(dir.path().join("missing"));
        let err = deploy_params(&deploy).unwrap_err();
        assert!(err.to_string().contains("--srcdir"));
    }

    #[test]
    fn report_lists_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let report = dir.path().join("report.json");
        let artifacts = vec![BundledArtifact {
            bundler: "deb",
            bundle_type: crate::bundler::BundleType::Installer,
            path: dir.path().join("hello_1.0_amd64.deb"),
            size: 42,
            checksum: "ab".repeat(32),
        }];
        write_report(&report, &artifacts).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&report).unwrap()).unwrap();
        assert_eq!(json[0]["bundler"], "deb");
        assert_eq!(json[0]["bundle_type"], "INSTALLER");
        assert_eq!(json[0]["size"], 42);
    }
}
