//! Test doubles for crosstool unit tests.
//!
//! Provides a command runner that records instead of spawning, a fetcher
//! that serves fixture bytes instead of touching the network, and helpers
//! for building tarball fixtures.
//!
//! # Example
//!
//! ```rust,ignore
//! let runner = RecordingRunner::new();
//! runner.fail_on("make -j", 2);
//!
//! let manager = ToolchainManager::with_parts(
//!     config,
//!     Box::new(runner.clone()),
//!     Box::new(FakeFetcher::new()),
//! );
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::core::error::ToolchainError;
use crate::sources::fetch::Fetcher;
use crate::util::process::{CommandRunner, ProcessBuilder};

/// One command seen by a [`RecordingRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// Full command line, `program arg ...`
    pub command: String,
    /// Working directory the command was given
    pub cwd: Option<PathBuf>,
}

#[derive(Debug, Default)]
struct RunnerState {
    calls: Vec<RecordedCall>,
    failures: Vec<(String, i32)>,
    missing: Vec<String>,
}

/// Command runner that records every call and never spawns anything.
///
/// Clones share state, so a test can keep a handle after moving a clone
/// into the code under test.
#[derive(Debug, Clone, Default)]
pub struct RecordingRunner {
    state: Rc<RefCell<RunnerState>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        RecordingRunner::default()
    }

    /// Make any command containing `pattern` exit with `status`.
    pub fn fail_on(&self, pattern: &str, status: i32) -> &Self {
        self.state
            .borrow_mut()
            .failures
            .push((pattern.to_string(), status));
        self
    }

    /// Report `program` as not installed.
    pub fn without_program(&self, program: &str) -> &Self {
        self.state.borrow_mut().missing.push(program.to_string());
        self
    }

    /// All recorded calls, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.borrow().calls.clone()
    }

    /// Recorded command lines, in order.
    pub fn commands(&self) -> Vec<String> {
        self.state
            .borrow()
            .calls
            .iter()
            .map(|c| c.command.clone())
            .collect()
    }
}

impl CommandRunner for RecordingRunner {
    fn execute(&self, cmd: &ProcessBuilder, expected: i32) -> Result<(), ToolchainError> {
        let command = cmd.display_command();
        let mut state = self.state.borrow_mut();
        state.calls.push(RecordedCall {
            command: command.clone(),
            cwd: cmd.get_cwd().map(Path::to_path_buf),
        });

        let status = state
            .failures
            .iter()
            .find(|(pattern, _)| command.contains(pattern.as_str()))
            .map(|(_, status)| *status)
            .unwrap_or(0);

        if status != expected {
            return Err(ToolchainError::Command {
                command,
                directory: cmd
                    .get_cwd()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from(".")),
                expected,
                actual: Some(status),
            });
        }
        Ok(())
    }

    fn has_program(&self, program: &str) -> bool {
        !self.state.borrow().missing.iter().any(|p| p == program)
    }
}

#[derive(Debug, Default)]
struct FetcherState {
    bodies: HashMap<String, Vec<u8>>,
    failing: Vec<String>,
    requests: Vec<String>,
}

/// Fetcher that writes fixture bytes instead of downloading.
///
/// URLs without a registered body get an empty file.
#[derive(Debug, Clone, Default)]
pub struct FakeFetcher {
    state: Rc<RefCell<FetcherState>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        FakeFetcher::default()
    }

    /// Serve `body` for `url`.
    pub fn serve(&self, url: &str, body: impl Into<Vec<u8>>) -> &Self {
        self.state
            .borrow_mut()
            .bodies
            .insert(url.to_string(), body.into());
        self
    }

    /// Make fetches of `url` fail after writing a partial file.
    pub fn fail(&self, url: &str) -> &Self {
        self.state.borrow_mut().failing.push(url.to_string());
        self
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.state.borrow().requests.clone()
    }
}

impl Fetcher for FakeFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), ToolchainError> {
        let mut state = self.state.borrow_mut();
        state.requests.push(url.to_string());

        if state.failing.iter().any(|u| u == url) {
            let _ = std::fs::write(dest, b"partial");
            return Err(ToolchainError::Download {
                url: url.to_string(),
                message: "HTTP 404 Not Found".to_string(),
            });
        }

        let body = state.bodies.get(url).cloned().unwrap_or_default();
        std::fs::write(dest, body).map_err(|e| ToolchainError::Download {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

/// The same location as the absolute `path`, spelled relative to the
/// current directory (`../../tmp/...`), without changing directory.
pub fn relative_to_cwd(path: &Path) -> PathBuf {
    let cwd = std::env::current_dir().unwrap();
    let mut relative = PathBuf::new();
    for _ in cwd.components().skip(1) {
        relative.push("..");
    }
    relative.join(path.strip_prefix("/").unwrap())
}

/// Build an in-memory `.tar.gz` containing the given files.
pub fn tar_gz_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut data = Vec::new();
    {
        let encoder = GzEncoder::new(&mut data, Compression::default());
        let mut builder = tar::Builder::new(encoder);

        for (path, contents) in files {
            let mut header = tar::Header::new_gnu();
            header.set_path(path).unwrap();
            header.set_size(contents.len() as u64);
            header.set_mode(0o755);
            header.set_cksum();
            builder.append(&header, *contents).unwrap();
        }

        builder.into_inner().unwrap().finish().unwrap();
    }
    data
}
