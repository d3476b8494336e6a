// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Top-level argument definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::{CompleteArgs, ConfigCommand, ModelsArgs};

/// omnilm - one completion API over many providers
#[derive(Parser, Debug)]
#[command(name = "omnilm")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "OMNILM_CONFIG_PATH",
        value_name = "FILE"
    )]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "OMNILM_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run completions for every model x prompt pair
    #[command(name = "complete")]
    Complete(CompleteArgs),

    /// List registered models and their aliases
    #[command(name = "models")]
    Models(ModelsArgs),

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}
