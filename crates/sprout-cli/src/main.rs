//! # sprout-cli
//!
//! Bootstrap installer for sites served by the osWFrame release server fleet.
//!
//! Checks that the installation root is usable, selects a responding mirror
//! for every server list, installs the configured packages with their
//! dependencies and hands off to the installed tools.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sprout_core::error::{SproutError, SproutResult};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod finalize;
mod output;
mod probe;

use commands::{CommandContext, ConfigArgs, InstallArgs};
use output::errors::ErrorFormatter;

/// Bootstrap installer for osWFrame release server packages
#[derive(Parser)]
#[command(name = "sprout", version, about = "Bootstrap installer for osWFrame packages")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check the environment, select mirrors and install packages (default)
    Install(InstallArgs),
    /// Select a mirror for every server list and show the result
    Probe(ConfigArgs),
    /// Check that the installation root is usable
    Check(ConfigArgs),
    /// Show version information
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose);
    setup_panic_handler();

    info!("Starting sprout v{}", env!("CARGO_PKG_VERSION"));

    let formatter = if cli.no_color {
        ErrorFormatter::plain()
    } else {
        ErrorFormatter::new()
    };

    match run_cli(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("{}", formatter.format_error(&e));
            ExitCode::FAILURE
        },
    }
}

fn run_cli(cli: Cli) -> SproutResult<u8> {
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| SproutError::io("Failed to create async runtime".to_string(), e))?;

    rt.block_on(async {
        let ctx = CommandContext::new(cli.no_color)?;
        let command = cli
            .command
            .unwrap_or_else(|| Commands::Install(InstallArgs::default()));

        commands::dispatch_command(command, &ctx).await
    })
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let default_filter = [
        "sprout",
        "sprout_core",
        "sprout_config",
        "sprout_registry",
        "sprout_archive",
        "sprout_installer",
    ]
    .iter()
    .map(|target| format!("{}={}", target, level))
    .collect::<Vec<_>>()
    .join(",");

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("sprout encountered an unexpected error: {}", panic_info);
        eprintln!("sprout crashed! This is a bug.");
        eprintln!("Please report this at: https://github.com/sprout-installer/sprout/issues");
        eprintln!("Error: {}", panic_info);
    }));
}
