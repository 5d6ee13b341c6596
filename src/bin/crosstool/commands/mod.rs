//! Command implementations

pub mod clean;
pub mod status;
pub mod update;

use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::ConfigArgs;
use crosstool::util::config::{ToolchainConfig, DEFAULT_CONFIG_FILE};
use crosstool::util::kconfig::KconfigValues;

/// Resolve the toolchain settings: file, then environment, then validation.
pub fn load_config(args: &ConfigArgs) -> Result<ToolchainConfig> {
    let mut config = if let Some(path) = &args.kconfig {
        let values = KconfigValues::load(path)?;
        ToolchainConfig::from_kconfig(&values)
            .with_context(|| format!("failed to load {}", path.display()))?
    } else if let Some(path) = &args.config {
        ToolchainConfig::load(path)?
    } else {
        ToolchainConfig::load_or_default(Path::new(DEFAULT_CONFIG_FILE))?
    };

    config.apply_env(|key| std::env::var(key).ok())?;
    config.validate()?;
    config.destdir = std::path::absolute(&config.destdir)
        .with_context(|| format!("invalid destdir: {}", config.destdir.display()))?;

    tracing::debug!(
        "toolchain for {} in {}",
        config.target,
        config.destdir.display()
    );
    Ok(config)
}
