//! Error types for the command line front end.
//!
//! Library code reports [`crate::bundler::Error`]; the CLI wraps it together
//! with argument, config file and I/O failures.

use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, BundlerError>;

/// Main error type for the binary
#[derive(Error, Debug)]
pub enum BundlerError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Bundler errors
    #[error("Bundler error: {0}")]
    Bundler(#[from] crate::bundler::Error),

    /// Generic errors from anyhow
    #[error("{0:#}")]
    Anyhow(#[from] anyhow::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// No bundler with the requested id
    #[error("No bundler matching the id {id} was found")]
    UnknownBundler {
        /// Requested id
        id: String,
    },
}

impl BundlerError {
    /// Advice attached to configuration errors, if any.
    pub fn advice(&self) -> Option<&str> {
        match self {
            BundlerError::Bundler(e) => e.advice(),
            _ => None,
        }
    }
}
