//! Crosstool CLI - incremental cross-toolchain builds

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use crosstool::util::shell::{Shell, Verbosity};

fn main() {
    let cli = Cli::parse();
    let shell = Shell::from_flags(cli.quiet, cli.verbose, cli.color);

    init_logging(&shell);

    if let Err(e) = run(cli, &shell) {
        shell.error(format_args!("{:#}", e));
        std::process::exit(1);
    }
}

/// Install the tracing subscriber. `RUST_LOG` wins over the flags.
fn init_logging(shell: &Shell) {
    let default = match shell.verbosity() {
        Verbosity::Quiet => "crosstool=error",
        Verbosity::Normal => "crosstool=info",
        Verbosity::Verbose => "crosstool=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli, shell: &Shell) -> Result<()> {
    match cli.command {
        Commands::Update(args) => commands::update::execute(args, &cli.config, shell),
        Commands::Status(args) => commands::status::execute(args, &cli.config, shell),
        Commands::Clean(args) => commands::clean::execute(args, &cli.config, shell),
    }
}
