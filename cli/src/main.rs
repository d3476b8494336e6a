// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # omnilm CLI
//!
//! Runs OpenAI-compatible completion batches across every configured provider.
//!
//! ## Commands
//!
//! - `omnilm complete -m MODEL... -p PROMPT...` - Run a models x prompts batch
//! - `omnilm models` - List registered models and aliases
//! - `omnilm config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing::info;

use omnilm_cli::cli::{Cli, Commands};
use omnilm_cli::commands;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is not an error
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    init_logging(&cli.log_level)?;
    info!("omnilm {} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(Commands::Complete(args)) => commands::complete::execute(args, cli.config).await,
        Some(Commands::Models(args)) => commands::models::execute(args, cli.config).await,
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await
        }
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}
