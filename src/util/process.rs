//! Subprocess execution utilities.
//!
//! Commands are structured argument vectors with an explicit working
//! directory. The process-wide current directory is never changed.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus};
use std::time::{Duration, Instant};

use crate::core::error::ToolchainError;

/// Interval between polls of a child running under a timeout.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Builder for subprocess execution.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    cwd: Option<PathBuf>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Get the working directory, if one was set.
    pub fn get_cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Build the Command. Stdout and stderr are inherited.
    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        cmd
    }

    /// Display the command for logs and error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Runs commands and checks their exit status.
pub trait CommandRunner {
    /// Run `cmd` to completion in its working directory.
    ///
    /// Fails unless the exit status equals `expected`.
    fn execute(&self, cmd: &ProcessBuilder, expected: i32) -> Result<(), ToolchainError>;

    /// Whether `program` can be run by this runner.
    fn has_program(&self, program: &str) -> bool {
        find_executable(program).is_some()
    }
}

/// Runs commands on the host, streaming their output to the terminal.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    timeout: Option<Duration>,
}

impl SystemRunner {
    pub fn new() -> Self {
        SystemRunner { timeout: None }
    }

    /// Kill commands that run longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn wait_with_timeout(
        child: &mut Child,
        timeout: Duration,
        cmd: &ProcessBuilder,
    ) -> Result<ExitStatus, ToolchainError> {
        let start = Instant::now();
        loop {
            let polled = child.try_wait().map_err(|source| ToolchainError::Spawn {
                command: cmd.display_command(),
                source,
            })?;
            if let Some(status) = polled {
                return Ok(status);
            }

            let elapsed = start.elapsed();
            if elapsed >= timeout {
                tracing::warn!("killing `{}` after {:?}", cmd.display_command(), elapsed);
                let _ = child.kill();
                let _ = child.wait();
                return Err(ToolchainError::CommandTimeout {
                    command: cmd.display_command(),
                    timeout,
                });
            }

            std::thread::sleep(POLL_INTERVAL.min(timeout - elapsed));
        }
    }
}

impl CommandRunner for SystemRunner {
    fn execute(&self, cmd: &ProcessBuilder, expected: i32) -> Result<(), ToolchainError> {
        tracing::info!("+ {}", cmd.display_command());

        let mut child = cmd
            .build_command()
            .spawn()
            .map_err(|source| ToolchainError::Spawn {
                command: cmd.display_command(),
                source,
            })?;

        let status = match self.timeout {
            Some(timeout) => Self::wait_with_timeout(&mut child, timeout, cmd)?,
            None => child.wait().map_err(|source| ToolchainError::Spawn {
                command: cmd.display_command(),
                source,
            })?,
        };

        if status.code() != Some(expected) {
            return Err(ToolchainError::Command {
                command: cmd.display_command(),
                directory: cmd
                    .get_cwd()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from(".")),
                expected,
                actual: status.code(),
            });
        }

        Ok(())
    }
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}
