//! Command line argument parsing and validation.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Native application packager
#[derive(Parser, Debug)]
#[command(
    name = "app_packager",
    version,
    about = "Builds application images and native installers",
    long_about = "Builds application images and native installers (.deb, .rpm, .app, .dmg, .pkg, .exe)
by driving the packaging tools of the host platform.

Usage:
  app_packager deploy --outdir out --native deb --name Hello --appclass com.example.Hello --srcdir dist
  app_packager deploy --outdir out --native --config app.toml -B linux.bundleName=hello
  app_packager bundlers --verbose
  app_packager params rpm

Exit code 0 = every requested bundle that can be built on this host was built."
)]
pub struct Args {
    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build application images and installers
    Deploy(DeployArgs),

    /// List the bundlers usable on this host
    Bundlers {
        /// Include bundler descriptions
        #[arg(short, long)]
        verbose: bool,
    },

    /// List the parameters a bundler accepts
    Params {
        /// Bundler id, e.g. deb or mac.app
        #[arg(value_name = "ID")]
        id: String,

        /// Include parameter descriptions
        #[arg(short, long)]
        verbose: bool,
    },
}

/// Arguments of `deploy`
#[derive(clap::Args, Debug, Default)]
pub struct DeployArgs {
    /// Directory the bundles are written to
    #[arg(long, value_name = "DIR")]
    pub outdir: PathBuf,

    /// Bundles to build: all, image, native, installer or a bundler id such as deb
    ///
    /// Given without a value it builds images and installers. Omitted, nothing is built.
    #[arg(long, value_name = "TYPE", num_args = 0..=1, default_missing_value = "native")]
    pub native: Option<String>,

    /// Application name
    #[arg(long)]
    pub name: Option<String>,

    /// Fully qualified main class
    #[arg(long, value_name = "CLASS")]
    pub appclass: Option<String>,

    /// Directory holding the application resources
    #[arg(long, value_name = "DIR")]
    pub srcdir: Option<PathBuf>,

    /// Files under --srcdir to include, separated by the platform path separator
    #[arg(long, value_name = "FILES", requires = "srcdir")]
    pub srcfiles: Option<String>,

    /// Vendor of the application
    #[arg(long)]
    pub vendor: Option<String>,

    /// Application title
    #[arg(long)]
    pub title: Option<String>,

    /// Application description
    #[arg(long)]
    pub description: Option<String>,

    /// Default argument passed to the application (repeatable)
    #[arg(long = "argument", value_name = "ARG", allow_hyphen_values = true)]
    pub arguments: Vec<String>,

    /// Do not sign bundles
    #[arg(long)]
    pub nosign: bool,

    /// Install the application as a service
    #[arg(long)]
    pub daemon: bool,

    /// Allow only one running instance
    #[arg(long)]
    pub singleton: bool,

    /// Let the user choose the installation directory
    #[arg(long)]
    pub installdir_chooser: bool,

    /// Preloader class
    #[arg(long, value_name = "CLASS")]
    pub preloader: Option<String>,

    /// Debug logging and keep intermediate files
    #[arg(short, long)]
    pub verbose: bool,

    /// Bundler parameter, KEY=VALUE or KEY for true (repeatable)
    #[arg(short = 'B', value_name = "KEY[=VALUE]")]
    pub bundle_args: Vec<String>,

    /// Properties file of bundler parameters
    #[arg(long, value_name = "FILE")]
    pub param_file: Option<PathBuf>,

    /// TOML file of bundler parameters
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write the produced artifacts as JSON to this file
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Whether debug logging was requested.
    pub fn verbose(&self) -> bool {
        match &self.command {
            Command::Deploy(deploy) => deploy.verbose,
            Command::Bundlers { verbose } | Command::Params { verbose, .. } => *verbose,
        }
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if let Command::Deploy(deploy) = &self.command {
            if deploy.outdir.as_os_str().is_empty() {
                return Err("--outdir cannot be empty".to_string());
            }
            if let Some(key) = deploy.bundle_args.iter().find(|a| a.starts_with('=')) {
                return Err(format!("Bundle argument -B{key} has no key"));
            }
        }
        Ok(())
    }
}

/// Runtime configuration derived from arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    output: super::OutputManager,
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self {
            output: super::OutputManager::new(args.verbose(), false),
        }
    }
}

impl RuntimeConfig {
    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }

    /// Whether verbose listings were requested
    pub fn is_verbose(&self) -> bool {
        self.output.is_verbose()
    }

    /// Print verbose message if in verbose mode
    pub fn verbose_println(&self, message: &str) -> std::io::Result<()> {
        self.output.verbose(message)
    }

    /// Print success message if not in quiet mode
    pub fn success(&self, message: &str) -> std::io::Result<()> {
        self.output.success(message)
    }

    /// Print warning message
    pub fn warn(&self, message: &str) -> std::io::Result<()> {
        self.output.warn(message)
    }
}
