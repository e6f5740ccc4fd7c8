//! Nova app cli definition and entrypoint.
mod ask;
mod serve;
pub mod ux;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nova_core::config::get_config;

use crate::log::setup_logging;

/// Nova - chat with a small text-to-text model in the browser.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Show verbose logs.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the chat web server.
    Serve {
        /// Address to listen on, e.g. 127.0.0.1:7860.
        #[arg(short, long)]
        bind: Option<String>,
        /// Model to use, must be defined in the config.
        #[arg(short, long)]
        model: Option<String>,
    },
    /// Answer a single question in the terminal.
    Ask {
        /// Question to answer.
        #[arg(required = true)]
        instruction: Vec<String>,
        /// Model to use, must be defined in the config.
        #[arg(short, long)]
        model: Option<String>,
    },
}

/// Runs the main CLI application.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        setup_logging().context("Failed to set up logging")?;
    }

    let config = get_config(cli.config).context("Failed to load configuration")?;

    match cli.command {
        Commands::Serve { bind, model } => serve::execute(bind, model, &config).await,
        Commands::Ask { instruction, model } => ask::execute(instruction, model, &config).await,
    }
}
