// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;
use tracing::info;

use omnilm_core::domain::client_config::{ClientConfigManifest, CONFIG_PATH_ENV};

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./omnilm-config.yaml)
        #[arg(short, long, default_value = "./omnilm-config.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, examples } => generate(output, examples).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = ClientConfigManifest::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. {}: {}",
            CONFIG_PATH_ENV,
            std::env::var(CONFIG_PATH_ENV)
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./omnilm-config.yaml");
        println!("  4. ~/.omnilm/config.yaml");
        println!("  5. /etc/omnilm/config.yaml");
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!("  Name: {}", config.metadata.name);
    if let Some(version) = &config.metadata.version {
        println!("  Version: {}", version);
    }
    println!();

    let spec = &config.spec;
    println!("{}", "Built-in Providers:".bold());
    println!("  Enabled: {}", spec.defaults.enabled);
    println!("  Required credentials: {}", spec.defaults.required.join(", "));
    println!();

    if !spec.api_keys.is_empty() {
        println!("{}", "API Keys:".bold());
        let mut namespaces: Vec<_> = spec.api_keys.iter().collect();
        namespaces.sort();
        for (namespace, value) in namespaces {
            println!("  {}: {}", namespace, mask_secret(value));
        }
        println!();
    }

    if !spec.providers.is_empty() {
        println!("{}", "Configured Providers:".bold());
        for provider in &spec.providers {
            let state = if provider.enabled {
                "enabled".green()
            } else {
                "disabled".dimmed()
            };
            println!(
                "  {} ({:?}, {})",
                provider.namespace.bold(),
                provider.provider_type,
                state
            );
            if let Some(endpoint) = &provider.endpoint {
                println!("    Endpoint: {}", endpoint);
            }
            println!("    Models: {}", provider.models.join(", "));
        }
        println!();
    }

    println!("{}", "Dispatch:".bold());
    println!(
        "  Request timeout: {}",
        spec.dispatch
            .request_timeout_ms
            .map(|ms| format!("{} ms", ms))
            .unwrap_or_else(|| "(none)".to_string())
    );
    println!(
        "  Max concurrency: {}",
        spec.dispatch
            .max_concurrency
            .map(|limit| limit.to_string())
            .unwrap_or_else(|| "(unbounded)".to_string())
    );
    println!();

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = ClientConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf, with_examples: bool) -> Result<()> {
    let sample = if with_examples {
        include_str!("../../templates/config-with-examples.yaml")
    } else {
        include_str!("../../templates/config-minimal.yaml")
    };

    std::fs::write(&output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))?;
    info!("Wrote sample configuration to {:?}", output);

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

/// Environment references are shown verbatim, literal keys are masked
fn mask_secret(value: &str) -> String {
    if value.starts_with("env:") {
        value.to_string()
    } else {
        "********".to_string()
    }
}
