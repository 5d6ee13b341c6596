//! `crosstool status` command

use anyhow::Result;

use crate::cli::{ConfigArgs, StatusArgs};
use crate::commands::load_config;
use crosstool::ops::{ComponentStatus, ToolchainManager};
use crosstool::util::shell::Shell;

pub fn execute(_args: StatusArgs, config_args: &ConfigArgs, shell: &Shell) -> Result<()> {
    let config = load_config(config_args)?;
    let manager = ToolchainManager::new(config)?;

    if shell.is_verbose() {
        shell.println(format_args!(
            "toolchain for {} in {}",
            manager.config().target,
            manager.layout().destdir().display()
        ));
    }

    for component in manager.status() {
        shell.println(format_line(&component));
        if shell.is_verbose() {
            shell.println(format_args!("    marker: {}", component.marker.display()));
        }
    }

    if manager.layout().build_dir().exists() {
        shell.warn(format_args!(
            "staging directory {} is left over from an interrupted build",
            manager.layout().build_dir().display()
        ));
    }

    Ok(())
}

fn format_line(component: &ComponentStatus) -> String {
    let state = if component.stale { "stale" } else { "up to date" };
    format!(
        "{:<12} {:<10} {:<8} {}",
        component.name, component.version, component.scope, state
    )
}
