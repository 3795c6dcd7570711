//! Deployer — reconcile an environment's workspace repo, then deploy its bundle.
//!
//! # Usage
//!
//! ```text
//! deployer [--config <path>] [-v] deploy --env <name> [--bundle-config <path>] [--max-retries N] [--capture-output]
//! deployer [--config <path>] [-v] reconcile --env <name>
//! deployer [--config <path>] envs [--json]
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{deploy::DeployArgs, envs::EnvsArgs, reconcile::ReconcileArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "deployer",
    version,
    about = "Reconcile workspace repos and deploy environment bundles",
    long_about = None,
)]
struct Cli {
    /// Config file. Defaults to ./deployer.yaml, then ~/.deployer/config.yaml.
    #[arg(long, short = 'c', global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log at debug level (RUST_LOG overrides).
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Reconcile the environment's repo, then run the deploy command with retries.
    Deploy(DeployArgs),

    /// Create or update the environment's repo without deploying.
    Reconcile(ReconcileArgs),

    /// List configured environments.
    Envs(EnvsArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let (_path, config) = commands::load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Deploy(args) => args.run(&config),
        Commands::Reconcile(args) => args.run(&config),
        Commands::Envs(args) => args.run(&config),
    }
}

fn init_tracing(verbose: bool) {
    use std::io::IsTerminal;
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(std::io::stdout().is_terminal())
        .try_init();
}
