//! BulletinPro CLI - Command-line interface for the sync engine
//!
//! Provides commands for:
//! - Creating the local database
//! - Pulling or pushing a single table
//! - Running one full sync pass
//! - Viewing per-table sync status
//! - Inspecting the configuration

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use bulletin_core::config::Config;

mod commands;
mod output;

use commands::{
    config::ConfigCommand,
    init::InitCommand,
    status::StatusCommand,
    sync::SyncCommand,
    table::{PullCommand, PushCommand},
    CliContext,
};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "bulletin", version, about = "BulletinPro local/remote sync tool")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create the local database and its tables
    Init(InitCommand),
    /// Copy one remote table into the local database
    Pull(PullCommand),
    /// Send one local table to the remote service
    Push(PushCommand),
    /// Run one full pass over every table
    Sync(SyncCommand),
    /// Show per-table synchronization status
    Status(StatusCommand),
    /// View and check configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load_with_env(&config_path);

    let filter = match cli.verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };
    let ctx = CliContext {
        config_path,
        config,
        format,
    };

    match cli.command {
        Commands::Init(cmd) => cmd.execute(&ctx).await,
        Commands::Pull(cmd) => cmd.execute(&ctx).await,
        Commands::Push(cmd) => cmd.execute(&ctx).await,
        Commands::Sync(cmd) => cmd.execute(&ctx).await,
        Commands::Status(cmd) => cmd.execute(&ctx).await,
        Commands::Config(cmd) => cmd.execute(&ctx).await,
    }
}
