//! Native application bundlers.
//!
//! A bundler turns a resolved [`ParamMap`] into an application image or an
//! installer for one platform. Every bundler follows the same two steps:
//!
//! 1. [`Bundler::validate`] resolves the parameters it needs and checks host,
//!    tooling and naming preconditions without touching the filesystem;
//! 2. [`Bundler::execute`] assembles the output tree and invokes one external
//!    packaging tool.
//!
//! [`Bundlers`] is the registry that selects bundlers for a request and drives
//! both steps.
//!
//! # Example
//!
//! ```no_run
//! use app_packager::bundler::{BundleRequest, Bundlers, params::ParamMap};
//! use std::path::Path;
//!
//! # async fn example() -> app_packager::bundler::Result<()> {
//! let mut params = ParamMap::new();
//! params.insert("applicationClass", "com.example.hello.Main");
//! params.insert("appResourcesList", "dist/");
//!
//! let artifacts = Bundlers::new()
//!     .generate(&params, Path::new("out"), &BundleRequest::parse("image"))
//!     .await?;
//! for artifact in artifacts {
//!     println!("{}: {} ({} bytes)", artifact.bundler, artifact.path.display(), artifact.size);
//! }
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod error;
pub mod image;
pub mod params;
pub mod platform;
pub mod utils;

pub use builder::{BundleRequest, BundledArtifact, Bundlers};
pub use error::{Error, Result};
pub use platform::Platform;

use async_trait::async_trait;
use params::{ParamInfo, ParamMap};
use std::{
    fmt,
    path::{Path, PathBuf},
};

/// What a bundler produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BundleType {
    /// An unpacked application directory (launcher, app files, runtime).
    Image,
    /// A platform installer wrapping an image.
    Installer,
}

impl fmt::Display for BundleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BundleType::Image => f.write_str("IMAGE"),
            BundleType::Installer => f.write_str("INSTALLER"),
        }
    }
}

/// A platform-specific packaging strategy.
#[async_trait]
pub trait Bundler: Send + Sync {
    /// Human readable name, e.g. "Linux DEB Installer".
    fn name(&self) -> &'static str;

    /// Short identifier used to select the bundler, e.g. `deb`.
    fn id(&self) -> &'static str;

    /// One-line description.
    fn description(&self) -> &'static str;

    /// Whether this bundler produces an image or an installer.
    fn bundle_type(&self) -> BundleType;

    /// Parameters the bundler reads, shared and bundler-specific.
    fn params(&self) -> Vec<&'static dyn ParamInfo>;

    /// Checks that `params` can be bundled on this host.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedPlatform`] when the host cannot run this bundler,
    /// a configuration error (see [`Error::is_config`]) otherwise.
    fn validate(&self, params: &mut ParamMap) -> Result<()>;

    /// Builds the bundle under `outdir`, returning the artifact path.
    async fn execute(&self, params: &mut ParamMap, outdir: &Path) -> Result<PathBuf>;
}
