//! Bundler registry and the validate-then-execute driver.

use super::checksum::measure;
use crate::bundler::{
    BundleType, Bundler, Error, Result,
    params::ParamMap,
    platform::{linux, macos, windows},
};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Which bundles a run should produce.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BundleRequest {
    /// Produce nothing.
    None,
    /// Every registered bundler.
    All,
    /// Application images only.
    Image,
    /// Images first, then installers.
    Native,
    /// Installers, optionally restricted to one bundler id.
    Installer(Option<String>),
}

impl BundleRequest {
    /// Parses a `--native` style value.
    ///
    /// `false`/`none` and the empty string request nothing, `all`/`true`
    /// request every bundler, `image`, `native` and `installer` select by
    /// type, and any other value selects the installer with that id.
    pub fn parse(value: &str) -> Self {
        match value {
            "" | "false" | "none" => BundleRequest::None,
            "all" | "true" => BundleRequest::All,
            "image" => BundleRequest::Image,
            "native" => BundleRequest::Native,
            "installer" => BundleRequest::Installer(None),
            format => BundleRequest::Installer(Some(format.to_lowercase())),
        }
    }

    fn format(&self) -> Option<&str> {
        match self {
            BundleRequest::Installer(format) => format.as_deref(),
            _ => None,
        }
    }
}

/// A bundle produced by [`Bundlers::generate`].
#[derive(Clone, Debug, Serialize)]
pub struct BundledArtifact {
    /// Id of the bundler that produced it.
    pub bundler: &'static str,
    /// Image or installer.
    pub bundle_type: BundleType,
    /// File or directory written.
    pub path: PathBuf,
    /// Total size in bytes.
    pub size: u64,
    /// Hex SHA-256 digest.
    pub checksum: String,
}

/// Registry of available bundlers.
pub struct Bundlers {
    bundlers: Vec<Box<dyn Bundler>>,
}

impl Default for Bundlers {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Bundlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.bundlers.iter().map(|b| b.id()))
            .finish()
    }
}

impl Bundlers {
    /// Every built-in bundler, images before installers.
    pub fn new() -> Self {
        Self::with_bundlers(vec![
            Box::new(linux::LinuxAppBundler::default()),
            Box::new(macos::MacAppBundler::default()),
            Box::new(windows::WinAppBundler::default()),
            Box::new(linux::DebBundler::default()),
            Box::new(linux::RpmBundler::default()),
            Box::new(macos::DmgBundler::default()),
            Box::new(macos::PkgBundler::default()),
            Box::new(windows::ExeBundler::default()),
        ])
    }

    /// A registry over an explicit bundler list.
    pub fn with_bundlers(bundlers: Vec<Box<dyn Bundler>>) -> Self {
        Self { bundlers }
    }

    /// All registered bundlers.
    pub fn all(&self) -> impl Iterator<Item = &dyn Bundler> {
        self.bundlers.iter().map(|b| b.as_ref())
    }

    /// Bundlers of the given type.
    pub fn bundlers(&self, bundle_type: BundleType) -> impl Iterator<Item = &dyn Bundler> {
        self.all().filter(move |b| b.bundle_type() == bundle_type)
    }

    /// Looks a bundler up by id, ignoring case.
    pub fn find(&self, id: &str) -> Option<&dyn Bundler> {
        self.all().find(|b| b.id().eq_ignore_ascii_case(id))
    }

    /// Bundlers selected by `request`, in run order.
    pub fn select(&self, request: &BundleRequest) -> Vec<&dyn Bundler> {
        let selected: Vec<&dyn Bundler> = match request {
            BundleRequest::None => Vec::new(),
            BundleRequest::All => self.all().collect(),
            BundleRequest::Image => self.bundlers(BundleType::Image).collect(),
            BundleRequest::Native => self
                .bundlers(BundleType::Image)
                .chain(self.bundlers(BundleType::Installer))
                .collect(),
            BundleRequest::Installer(_) => self.bundlers(BundleType::Installer).collect(),
        };
        match request.format() {
            Some(format) => selected
                .into_iter()
                .filter(|b| b.id().eq_ignore_ascii_case(format))
                .collect(),
            None => selected,
        }
    }

    /// Validates and executes every selected bundler.
    ///
    /// Each bundler works on its own copy of `params`. Bundlers that cannot
    /// run on this host or whose configuration is incomplete are skipped and
    /// logged; the first execution failure aborts the run.
    pub async fn generate(
        &self,
        params: &ParamMap,
        outdir: &Path,
        request: &BundleRequest,
    ) -> Result<Vec<BundledArtifact>> {
        let mut artifacts = Vec::new();

        for bundler in self.select(request) {
            let mut local = params.clone();

            match bundler.validate(&mut local) {
                Ok(()) => {}
                Err(Error::UnsupportedPlatform) => {
                    log::debug!(
                        "Bundler {} skipped because the bundler does not support bundling on this platform.",
                        bundler.name()
                    );
                    continue;
                }
                Err(e) if e.is_config() => {
                    match e.advice() {
                        Some(advice) => log::info!(
                            "Bundler {} skipped because of a configuration problem: {}\n  Advice to fix: {}",
                            bundler.name(),
                            e,
                            advice
                        ),
                        None => log::info!(
                            "Bundler {} skipped because of a configuration problem: {}",
                            bundler.name(),
                            e
                        ),
                    }
                    continue;
                }
                Err(e) => return Err(e),
            }

            log::info!("Running {} ({})", bundler.name(), bundler.id());
            let path = bundler.execute(&mut local, outdir).await?;
            let (size, checksum) = measure(&path).await?;

            artifacts.push(BundledArtifact {
                bundler: bundler.id(),
                bundle_type: bundler.bundle_type(),
                path,
                size,
                checksum,
            });
        }

        Ok(artifacts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::params::ParamInfo;
    use async_trait::async_trait;

    struct Fake {
        id: &'static str,
        kind: BundleType,
        outcome: fn() -> Result<()>,
    }

    #[async_trait]
    impl Bundler for Fake {
        fn name(&self) -> &'static str {
            self.id
        }
        fn id(&self) -> &'static str {
            self.id
        }
        fn description(&self) -> &'static str {
            "test bundler"
        }
        fn bundle_type(&self) -> BundleType {
            self.kind
        }
        fn params(&self) -> Vec<&'static dyn ParamInfo> {
            Vec::new()
        }
        fn validate(&self, params: &mut ParamMap) -> Result<()> {
            params.insert("touched", self.id);
            (self.outcome)()
        }
        async fn execute(&self, params: &mut ParamMap, outdir: &Path) -> Result<PathBuf> {
            assert!(params.contains_key("touched"));
            let path = outdir.join(format!("{}.out", self.id));
            tokio::fs::write(&path, self.id).await?;
            Ok(path)
        }
    }

    fn registry() -> Bundlers {
        Bundlers::with_bundlers(vec![
            Box::new(Fake { id: "img", kind: BundleType::Image, outcome: || Ok(()) }),
            Box::new(Fake {
                id: "skip-platform",
                kind: BundleType::Installer,
                outcome: || Err(Error::UnsupportedPlatform),
            }),
            Box::new(Fake {
                id: "skip-config",
                kind: BundleType::Installer,
                outcome: || Err(Error::config("Can not find tool.", "Install it.")),
            }),
            Box::new(Fake { id: "EXE", kind: BundleType::Installer, outcome: || Ok(()) }),
        ])
    }

    #[test]
    fn request_parsing() {
        assert_eq!(BundleRequest::parse("false"), BundleRequest::None);
        assert_eq!(BundleRequest::parse(""), BundleRequest::None);
        assert_eq!(BundleRequest::parse("true"), BundleRequest::All);
        assert_eq!(BundleRequest::parse("image"), BundleRequest::Image);
        assert_eq!(BundleRequest::parse("native"), BundleRequest::Native);
        assert_eq!(BundleRequest::parse("installer"), BundleRequest::Installer(None));
        assert_eq!(
            BundleRequest::parse("DEB"),
            BundleRequest::Installer(Some("deb".into()))
        );
    }

    #[test]
    fn selection_orders_images_first_and_filters_format() {
        let registry = registry();
        let ids = |r: &BundleRequest| registry.select(r).iter().map(|b| b.id()).collect::<Vec<_>>();

        assert_eq!(ids(&BundleRequest::Native)[0], "img");
        assert_eq!(ids(&BundleRequest::Native).len(), 4);
        assert_eq!(ids(&BundleRequest::Image), vec!["img"]);
        assert_eq!(ids(&BundleRequest::parse("exe")), vec!["EXE"]);
        assert!(ids(&BundleRequest::None).is_empty());
    }

    #[tokio::test]
    async fn skipped_bundlers_do_not_fail_the_run() {
        let out = tempfile::tempdir().unwrap();
        let params = ParamMap::new();
        let artifacts = registry()
            .generate(&params, out.path(), &BundleRequest::All)
            .await
            .unwrap();

        let ids: Vec<_> = artifacts.iter().map(|a| a.bundler).collect();
        assert_eq!(ids, vec!["img", "EXE"]);
        assert_eq!(artifacts[0].size, 3);
        assert_eq!(artifacts[0].checksum.len(), 64);
        assert!(params.is_empty());
    }

    #[tokio::test]
    async fn bad_parameter_value_skips_only_that_bundler() {
        let registry = Bundlers::with_bundlers(vec![
            Box::new(crate::bundler::platform::linux::LinuxAppBundler::for_host(
                crate::bundler::Platform::Linux,
            )),
            Box::new(Fake { id: "img", kind: BundleType::Image, outcome: || Ok(()) }),
        ]);
        let out = tempfile::tempdir().unwrap();
        let mut params = ParamMap::new();
        params.insert("applicationClass", "com.example.Hello");
        params.insert("runtime", out.path().join("no-such-jre").display().to_string());

        let artifacts = registry
            .generate(&params, out.path(), &BundleRequest::All)
            .await
            .unwrap();
        let ids: Vec<_> = artifacts.iter().map(|a| a.bundler).collect();
        assert_eq!(ids, vec!["img"]);
    }

    #[tokio::test]
    async fn non_config_errors_abort_the_run() {
        let registry = Bundlers::with_bundlers(vec![Box::new(Fake {
            id: "broken",
            kind: BundleType::Image,
            outcome: || Err(Error::GenericError("disk on fire".into())),
        })]);
        let out = tempfile::tempdir().unwrap();
        let err = registry
            .generate(&ParamMap::new(), out.path(), &BundleRequest::All)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("disk on fire"));
    }
}
