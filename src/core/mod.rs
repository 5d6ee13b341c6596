//! Core data structures for crosstool.
//!
//! - Component descriptors and install scopes
//! - The destination directory layout
//! - The recipe interface
//! - The error type shared by the library

pub mod component;
pub mod error;
pub mod layout;
pub mod recipe;

pub use component::{ComponentSpec, InstallScope};
pub use error::ToolchainError;
pub use layout::Layout;
pub use recipe::{BuildContext, ComponentRecipe};
