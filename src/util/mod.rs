//! Shared utilities

pub mod config;
pub mod fs;
pub mod kconfig;
pub mod process;
pub mod shell;

pub use config::ToolchainConfig;
pub use kconfig::KconfigValues;
pub use process::{CommandRunner, ProcessBuilder, SystemRunner};
pub use shell::Shell;
