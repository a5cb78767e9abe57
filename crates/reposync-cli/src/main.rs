mod commands;
mod config;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::update::UpdateArgs;

#[derive(Parser)]
#[command(name = "reposync")]
#[command(about = "Synchronize Maven artifacts and their dependencies into a target repository")]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Log resolution details
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve artifacts with their dependencies and publish them to the target
    Update(UpdateArgs),
    /// List the configured source repositories
    Repositories,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let app_config = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Update(args) => commands::update::run(&app_config, &args).await,
        Command::Repositories => commands::repositories::run(&app_config),
    }
}
