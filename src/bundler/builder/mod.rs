//! Bundle enumeration and coordination.
//!
//! - [`orchestrator`] - the [`Bundlers`] registry and [`BundleRequest`] selection
//! - [`checksum`] - artifact size and SHA-256 calculation
//! - [`signing`] - keychain lookups and `codesign`
//! - [`tool_detection`] - cached external tool probes

mod checksum;
mod orchestrator;
pub mod signing;
pub mod tool_detection;

pub use orchestrator::{BundleRequest, BundledArtifact, Bundlers};
