//! Multi-platform application packager.
//!
//! This library provides the bundling functionality for creating:
//! - application images for Linux, macOS and Windows
//! - Linux packages (.deb, .rpm)
//! - macOS packages (.dmg, .pkg)
//! - Windows installers (.exe via Inno Setup)
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod bundler;
pub mod cli;
pub mod config;
pub mod error;

// Re-export commonly used types
pub use error::{BundlerError, CliError, Result};
