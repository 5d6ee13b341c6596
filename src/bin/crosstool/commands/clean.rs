//! `crosstool clean` command

use anyhow::Result;

use crate::cli::{CleanArgs, ConfigArgs};
use crate::commands::load_config;
use crosstool::core::Layout;
use crosstool::util::fs::remove_dir_all_if_exists;
use crosstool::util::shell::{Shell, Status};

pub fn execute(args: CleanArgs, config_args: &ConfigArgs, shell: &Shell) -> Result<()> {
    let config = load_config(config_args)?;
    let layout = Layout::from_config(&config);

    let mut dirs = vec![layout.build_dir()];
    if args.all {
        // Markers live in these trees, so everything rebuilds next time.
        dirs.push(layout.generic_dir());
        dirs.push(layout.target_dir());
    }

    for dir in dirs {
        if dir.exists() {
            remove_dir_all_if_exists(dir)?;
            shell.status(Status::Removed, dir.display());
        }
    }

    Ok(())
}
