//! `crosstool update` command

use anyhow::Result;

use crate::cli::{ConfigArgs, UpdateArgs};
use crate::commands::load_config;
use crosstool::ops::{ToolchainManager, UpdateOutcome};
use crosstool::util::shell::{Shell, Status};

pub fn execute(args: UpdateArgs, config_args: &ConfigArgs, shell: &Shell) -> Result<()> {
    let mut config = load_config(config_args)?;
    if let Some(jobs) = args.jobs {
        config.make_jobs = jobs;
        config.validate()?;
    }

    let manager = ToolchainManager::new(config)?;

    let outcome = manager.update().map_err(|e| {
        let stage = e.stage();
        anyhow::Error::new(e).context(format!("toolchain update failed at the {} step", stage))
    })?;

    match outcome {
        UpdateOutcome::UpToDate => {
            shell.status(Status::Fresh, "toolchain already up-to-date, nothing to be done");
        }
        UpdateOutcome::Built {
            components,
            elapsed,
        } => {
            shell.status(
                Status::Finished,
                format_args!(
                    "{} in {:.2}s",
                    components.join(", "),
                    elapsed.as_secs_f64()
                ),
            );
        }
    }

    Ok(())
}
