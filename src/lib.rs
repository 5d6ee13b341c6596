//! Crosstool - incremental builds of cross-compilation toolchains
//!
//! This crate provides the library behind the `crosstool` binary: component
//! recipes, source fetching, subprocess execution, and the manager that
//! rebuilds only the components whose installed markers are missing.

pub mod core;
pub mod ops;
pub mod recipes;
pub mod sources;
pub mod util;

/// Test doubles for crosstool unit tests.
///
/// Only available when compiling tests. Provides a recording command runner
/// and a fetcher that serves fixture bytes.
#[cfg(test)]
pub mod test_support;

pub use crate::core::{ComponentRecipe, ComponentSpec, InstallScope, Layout, ToolchainError};
pub use ops::{ToolchainManager, UpdateOutcome};
pub use util::ToolchainConfig;
