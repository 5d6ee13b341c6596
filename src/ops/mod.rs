//! High-level operations.
//!
//! This module contains the implementation of crosstool commands.

pub mod staging;
pub mod toolchain_update;

pub use staging::StagingDir;
pub use toolchain_update::{ComponentStatus, ToolchainManager, UpdateOutcome};
