//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use crosstool::util::shell::ColorChoice;

/// Crosstool - incremental builds of cross-compilation toolchains
#[derive(Parser)]
#[command(name = "crosstool")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Coloring: auto, always, never
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    pub color: ColorChoice,

    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where the toolchain settings come from.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Path to a TOML config file (default: ./crosstool.toml if present)
    #[arg(long, global = true, env = "CROSSTOOL_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Read settings from a Kconfig `.config` file instead
    #[arg(long, global = true, value_name = "PATH", conflicts_with = "config")]
    pub kconfig: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build every component whose installed marker is missing
    Update(UpdateArgs),

    /// Show which components are installed and which are stale
    Status(StatusArgs),

    /// Remove the staging directory
    Clean(CleanArgs),
}

#[derive(Args)]
pub struct UpdateArgs {
    /// Number of parallel make jobs (overrides the config)
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

#[derive(Args)]
pub struct StatusArgs {}

#[derive(Args)]
pub struct CleanArgs {
    /// Also remove the generic and target install trees
    #[arg(long)]
    pub all: bool,
}
