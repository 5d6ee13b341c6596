//! Toolchain configuration.
//!
//! Settings are resolved once at startup, from (lowest to highest
//! precedence):
//! - built-in defaults
//! - a TOML file (`crosstool.toml`) or a Kconfig `.config` file
//! - `CROSSTOOL_*` environment variables
//!
//! ```toml
//! arch = "x86_64"
//! platform = "efi"
//! destdir = "build/tools"
//! target = "x86_64-efi-pe"
//! make_jobs = 16
//! command_timeout_secs = 3600
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::util::kconfig::{KconfigValue, KconfigValues};

/// Default configuration file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "crosstool.toml";

/// Environment variable overriding the destination root.
pub const ENV_DESTDIR: &str = "CROSSTOOL_DESTDIR";

/// Environment variable overriding the target triple.
pub const ENV_TARGET: &str = "CROSSTOOL_TARGET";

/// Environment variable overriding the job count.
pub const ENV_JOBS: &str = "CROSSTOOL_JOBS";

/// Immutable settings for one toolchain manager run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    /// Architecture identifier (e.g. `x86_64`)
    pub arch: String,

    /// Platform identifier (e.g. `efi`)
    pub platform: String,

    /// Destination root for installs, markers, sources and staging
    pub destdir: PathBuf,

    /// Target triple the toolchain is built for (e.g. `x86_64-efi-pe`)
    pub target: String,

    /// Job count passed through to `make -j`
    pub make_jobs: usize,

    /// Upper bound on any single external command, in seconds
    pub command_timeout_secs: Option<u64>,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        ToolchainConfig {
            arch: "x86_64".to_string(),
            platform: "efi".to_string(),
            destdir: PathBuf::from("build").join("tools"),
            target: "x86_64-efi-pe".to_string(),
            make_jobs: 16,
            command_timeout_secs: None,
        }
    }
}

impl ToolchainConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read toolchain config: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse toolchain config: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if the file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("no config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Build configuration from a parsed Kconfig `.config` file.
    ///
    /// Keys absent from the file keep their defaults.
    pub fn from_kconfig(values: &KconfigValues) -> Result<Self> {
        if !values.configured() {
            bail!("build configuration is missing or invalid; reconfigure and try again");
        }

        let mut config = ToolchainConfig::default();

        if let Some(arch) = values.get_str("ARCH") {
            config.arch = arch.to_string();
        }
        if let Some(platform) = values.get_str("PLATFORM") {
            config.platform = platform.to_string();
        }
        if let Some(dir) = values.get_str("TOOLCHAIN_DIR") {
            config.destdir = PathBuf::from(dir);
        }
        if let Some(target) = values.get_str("TOOLCHAIN_TARGET") {
            config.target = target.to_string();
        }
        match values.get("TOOLCHAIN_MAKE_JOBS") {
            Some(KconfigValue::Int(jobs)) => {
                config.make_jobs = usize::try_from(*jobs)
                    .with_context(|| format!("invalid TOOLCHAIN_MAKE_JOBS: {}", jobs))?;
            }
            Some(other) => bail!("TOOLCHAIN_MAKE_JOBS must be an integer, found {}", other),
            None => {}
        }
        match values.get("TOOLCHAIN_COMMAND_TIMEOUT") {
            Some(KconfigValue::Int(secs)) => {
                config.command_timeout_secs = Some(
                    u64::try_from(*secs)
                        .with_context(|| format!("invalid TOOLCHAIN_COMMAND_TIMEOUT: {}", secs))?,
                );
            }
            Some(other) => bail!("TOOLCHAIN_COMMAND_TIMEOUT must be an integer, found {}", other),
            None => {}
        }

        Ok(config)
    }

    /// Apply `CROSSTOOL_*` overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_DESTDIR) {
            self.destdir = PathBuf::from(dir);
        }
        if let Some(target) = lookup(ENV_TARGET) {
            self.target = target;
        }
        if let Some(jobs) = lookup(ENV_JOBS) {
            self.make_jobs = jobs
                .trim()
                .parse()
                .with_context(|| format!("invalid {}: `{}`", ENV_JOBS, jobs))?;
        }
        Ok(())
    }

    /// Reject settings the build cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.make_jobs == 0 {
            bail!("make_jobs must be at least 1");
        }
        if self.target.trim().is_empty() {
            bail!("target triple must not be empty");
        }
        if self.destdir.as_os_str().is_empty() {
            bail!("destdir must not be empty");
        }
        Ok(())
    }

    /// The per-command timeout, if configured.
    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }
}
