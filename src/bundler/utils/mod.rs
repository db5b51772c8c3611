//! Shared helpers for the bundlers.
//!
//! - [`fs`] - async file system operations
//! - [`process`] - external tool invocation
//! - [`template`] - resource templates with drop-in overrides

pub mod fs;
pub mod process;
pub mod template;
