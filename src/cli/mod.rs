//! Command line interface for the packager.
//!
//! `deploy` builds bundles, `bundlers` and `params` describe what this host
//! can build and how to configure it.

mod args;
pub mod commands;
mod output;

pub use args::{Args, Command, DeployArgs, RuntimeConfig};
pub use output::OutputManager;

use crate::error::{CliError, Result};

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    init_logging(args.verbose());

    args.validate()
        .map_err(|reason| CliError::InvalidArguments { reason })?;
    let config = RuntimeConfig::from(&args);

    match args.command {
        Command::Deploy(deploy) => commands::deploy(&deploy, &config).await,
        Command::Bundlers { .. } => commands::list_bundlers(&config),
        Command::Params { id, .. } => commands::list_params(&id, &config),
    }
}

/// `RUST_LOG` wins; otherwise debug when verbose, info when not.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}
