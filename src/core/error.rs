//! Toolchain build error types.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Error raised by any stage of a toolchain component build.
///
/// The first failure aborts the component being built and the whole
/// update; nothing is retried.
#[derive(Debug, Error)]
pub enum ToolchainError {
    /// The fetch of a source URL did not complete.
    #[error("failed to download `{url}`: {message}")]
    Download { url: String, message: String },

    /// An archive could not be unpacked into the staging directory.
    #[error("failed to unpack `{}`: {message}", path.display())]
    Unpack { path: PathBuf, message: String },

    /// A command exited with a status other than the expected one.
    #[error(
        "command `{command}` in `{}` exited with {}, expected {expected}",
        directory.display(),
        format_status(*actual)
    )]
    Command {
        command: String,
        directory: PathBuf,
        expected: i32,
        actual: Option<i32>,
    },

    /// A command ran longer than the configured bound and was killed.
    #[error("command `{command}` timed out after {}s", timeout.as_secs())]
    CommandTimeout { command: String, timeout: Duration },

    /// A command could not be started at all.
    #[error("failed to run `{command}`")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    /// Creating or removing a staging/install directory (or marker) failed.
    #[error("directory operation failed on `{}`", path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A host tool needed by a recipe is not on `PATH`.
    #[error("required host tool `{tool}` was not found in PATH")]
    MissingTool { tool: String },
}

impl ToolchainError {
    /// Wrap an I/O error on `path` as a directory failure.
    pub fn directory(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ToolchainError::Directory {
            path: path.into(),
            source,
        }
    }

    /// Short name of the failing stage, used in the CLI diagnostic.
    pub fn stage(&self) -> &'static str {
        match self {
            ToolchainError::Download { .. } => "download",
            ToolchainError::Unpack { .. } => "unpack",
            ToolchainError::Command { .. }
            | ToolchainError::CommandTimeout { .. }
            | ToolchainError::Spawn { .. } => "command",
            ToolchainError::Directory { .. } => "directory",
            ToolchainError::MissingTool { .. } => "preflight",
        }
    }
}

fn format_status(status: Option<i32>) -> String {
    match status {
        Some(code) => format!("status {}", code),
        None => "no status (terminated by signal)".to_string(),
    }
}
