//! Subcommand implementations.

mod bundlers;
mod deploy;
mod params;

pub use bundlers::list_bundlers;
pub use deploy::{deploy, deploy_params};
pub use params::list_params;
