//! Error types for bundler operations.
//!
//! Two families of failure exist: configuration problems found while
//! validating a parameter map ([`Error::Config`], [`Error::UnsupportedPlatform`])
//! and execution failures raised while assembling or packaging
//! (I/O, subprocess, template rendering).

use std::{
    fmt::Display,
    io,
    path::{Path, PathBuf},
};
use thiserror::Error as DeriveError;

/// Result type alias for bundler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the parameter registry and the bundlers.
#[derive(Debug, DeriveError)]
#[non_exhaustive]
pub enum Error {
    /// A configuration problem, carrying remediation advice.
    #[error("{message}")]
    Config {
        /// What is wrong.
        message: String,
        /// How to fix it.
        advice: Option<String>,
    },

    /// The bundler cannot run on the current host.
    #[error("bundler does not support this platform")]
    UnsupportedPlatform,

    /// A parameter's default function re-entered a key that is still resolving.
    #[error("parameter resolution cycle: {chain}")]
    ResolutionCycle {
        /// The resolution chain, e.g. `a -> b -> a`.
        chain: String,
    },

    /// A parameter required by the bundler resolved to nothing.
    #[error("parameter '{0}' has no value")]
    MissingParameter(String),

    /// The map holds a value of a different type than the parameter declares.
    #[error("parameter '{id}' holds a {found} value, expected {expected}")]
    ParamType {
        /// Parameter key.
        id: String,
        /// Type the parameter declares.
        expected: &'static str,
        /// Type found in the map.
        found: &'static str,
    },

    /// I/O failure with the operation and path that caused it.
    #[error("{context} {}: {error}", path.display())]
    Fs {
        /// Operation being performed.
        context: &'static str,
        /// Path involved.
        path: PathBuf,
        /// Underlying error.
        error: io::Error,
    },

    /// A subprocess could not be spawned.
    #[error("failed to run command {command}: {error}")]
    CommandFailed {
        /// Program name.
        command: String,
        /// Spawn error.
        error: io::Error,
    },

    /// A subprocess ran and exited unsuccessfully.
    #[error("{tool} failed ({status}): {stderr}")]
    ToolFailed {
        /// Program name.
        tool: String,
        /// Exit status description.
        status: String,
        /// Captured standard error.
        stderr: String,
    },

    /// Bare I/O error.
    #[error("{0}")]
    IoError(#[from] io::Error),

    /// Directory traversal error.
    #[error("{0}")]
    WalkDir(#[from] walkdir::Error),

    /// Path prefix stripping error.
    #[error("{0}")]
    StripPrefix(#[from] std::path::StripPrefixError),

    /// Template registration error.
    #[error("{0}")]
    Template(#[from] Box<handlebars::TemplateError>),

    /// Template render error.
    #[error("{0}")]
    Render(#[from] handlebars::RenderError),

    /// Property list serialization error.
    #[error("{0}")]
    Plist(#[from] plist::Error),

    /// Archive (jar) read error.
    #[error("{0}")]
    Zip(#[from] zip::result::ZipError),

    /// Invalid glob pattern in a resource list.
    #[error("{0}")]
    Pattern(#[from] glob::PatternError),

    /// Architecture not supported by a package format.
    #[error("architecture error: {0}")]
    ArchError(String),

    /// Anything else.
    #[error("{0}")]
    GenericError(String),
}

impl Error {
    /// Builds a configuration error with advice.
    pub fn config(message: impl Into<String>, advice: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            advice: Some(advice.into()),
        }
    }

    /// Remediation advice, when this is a configuration error that has one.
    pub fn advice(&self) -> Option<&str> {
        match self {
            Error::Config { advice, .. } => advice.as_deref(),
            _ => None,
        }
    }

    /// True for errors found during validation rather than execution.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Error::Config { .. }
                | Error::ResolutionCycle { .. }
                | Error::MissingParameter(_)
                | Error::ParamType { .. }
        )
    }
}

/// Attaches an operation and path to I/O errors.
pub trait ErrorExt<T> {
    /// Wraps the error as [`Error::Fs`].
    fn fs_context(self, context: &'static str, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, io::Error> {
    fn fs_context(self, context: &'static str, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context,
            path: path.as_ref().to_path_buf(),
            error,
        })
    }
}

/// Adds a human readable context message to errors and missing options.
pub trait Context<T> {
    /// Wraps the error with a fixed message.
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static;

    /// Wraps the error with a lazily built message.
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T> Context<T> for Result<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.map_err(|e| Error::GenericError(format!("{context}: {e}")))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| Error::GenericError(format!("{}: {e}", f())))
    }
}

impl<T> Context<T> for Option<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.ok_or_else(|| Error::GenericError(context.to_string()))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.ok_or_else(|| Error::GenericError(f().to_string()))
    }
}

/// Returns early with a [`Error::GenericError`].
#[macro_export]
macro_rules! bail {
    ($msg:literal $(,)?) => {
        return Err($crate::bundler::Error::GenericError(format!($msg)))
    };
    ($fmt:literal, $($arg:tt)*) => {
        return Err($crate::bundler::Error::GenericError(format!($fmt, $($arg)*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_carry_advice() {
        let err = Error::config("Can not find dpkg-deb.", "Please install required packages.");
        assert!(err.is_config());
        assert_eq!(err.advice(), Some("Please install required packages."));
        assert_eq!(err.to_string(), "Can not find dpkg-deb.");
    }

    #[test]
    fn fs_context_names_path() {
        let io: std::result::Result<(), io::Error> =
            Err(io::Error::new(io::ErrorKind::NotFound, "gone"));
        let err = io.fs_context("reading icon", "/tmp/icon.png").unwrap_err();
        assert_eq!(err.to_string(), "reading icon /tmp/icon.png: gone");
        assert!(!err.is_config());
    }
}
