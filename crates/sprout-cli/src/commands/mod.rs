//! Command implementations and dispatch logic.
//!
//! Each command is an async function taking its arguments and the shared
//! CommandContext, returning the process exit code.

use std::path::PathBuf;

use camino::Utf8PathBuf;
use clap::Args;
use sprout_config::{CliOverrides, ConfigLayering, ConfigLoader, ConfigSource, SproutToml};
use sprout_core::error::{SproutError, SproutResult};
use sprout_registry::{AutoTransport, ServerRegistry};
use tracing::info;

pub mod install;
pub mod servers;


use crate::output::OutputHandler;
use crate::probe::check_environment;
use crate::Commands;

/// Options selecting and overriding the configuration
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Configuration file (default: ./sprout.toml, else the built-in server list)
    #[arg(long, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Installation root
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Name this site reports to the release servers
    #[arg(long, value_name = "NAME")]
    pub server_name: Option<String>,
}

/// Arguments of `sprout install`
#[derive(Args, Debug, Clone, Default)]
pub struct InstallArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Packages to install instead of the configured ones
    #[arg(value_name = "PKG@RELEASE[@LIST]")]
    pub packages: Vec<String>,
}

/// Shared context for all commands
pub struct CommandContext {
    pub cwd: PathBuf,
    pub output: OutputHandler,
}

impl CommandContext {
    /// Create a new command context
    pub fn new(no_color: bool) -> SproutResult<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| SproutError::io("Failed to get current directory".to_string(), e))?;

        Ok(Self {
            cwd,
            output: if no_color {
                OutputHandler::plain()
            } else {
                OutputHandler::new()
            },
        })
    }
}

/// Effective configuration of a command
pub struct Settings {
    pub config: SproutToml,
    pub source: ConfigSource,
    pub root: PathBuf,
}

impl Settings {
    /// Load configuration and apply environment and flag overrides
    pub async fn load(args: &ConfigArgs, ctx: &CommandContext) -> SproutResult<Self> {
        let cwd = Utf8PathBuf::from_path_buf(ctx.cwd.clone()).map_err(|path| SproutError::ConfigValidation {
            field: "cwd".to_string(),
            reason: format!("Working directory {} is not valid UTF-8", path.display()),
        })?;

        let loader = ConfigLoader::new(cwd);
        let (config, source) = loader.load(args.config.as_deref()).await?;

        let overrides = CliOverrides {
            root: args.root.clone(),
            server_name: args.server_name.clone(),
        };
        let config = ConfigLayering::merge_configs(config, &ConfigLayering::collect_env_overrides(), &overrides)?;
        let root = config.root_dir(&ctx.cwd);

        info!("Using configuration from {}", source);
        Ok(Self { config, source, root })
    }

    /// Registry holding every configured server list
    pub fn registry(&self) -> ServerRegistry {
        let mut registry = ServerRegistry::new();
        for (name, list) in &self.config.server_lists {
            registry.register(name.clone(), list.clone());
        }
        registry
    }

    /// Transport according to the configured backend
    pub fn transport(&self) -> SproutResult<AutoTransport> {
        AutoTransport::connect(self.config.transport.backend, self.config.transport_config())
    }
}

/// Dispatch a command to its handler
pub async fn dispatch_command(command: Commands, ctx: &CommandContext) -> SproutResult<u8> {
    match command {
        Commands::Install(args) => {
            info!("Installing packages: {:?}", args.packages);
            install::execute(args, ctx).await
        },
        Commands::Probe(args) => {
            info!("Probing server lists");
            servers::execute(args, ctx).await
        },
        Commands::Check(args) => {
            info!("Checking environment");
            check_root(args, ctx).await
        },
        Commands::Version => show_version(ctx),
    }
}

/// Run only the environment probe
async fn check_root(args: ConfigArgs, ctx: &CommandContext) -> SproutResult<u8> {
    let settings = Settings::load(&args, ctx).await?;

    ctx.output
        .step("🔍", &format!("Checking {}", settings.root.display()));
    check_environment(&settings.root).into_result()?;
    ctx.output.success("Environment is ready for installation");

    Ok(0)
}

fn show_version(ctx: &CommandContext) -> SproutResult<u8> {
    let target = format!("{}-{}", std::env::consts::ARCH, std::env::consts::OS);

    ctx.output
        .info(&format!("sprout v{}", env!("CARGO_PKG_VERSION")));
    ctx.output.info(&format!("Built: {}", env!("BUILD_DATE")));
    ctx.output.info(&format!("Target: {}", target));
    ctx.output.info(&format!("Rust: {}", env!("RUSTC_VERSION")));

    Ok(0)
}
