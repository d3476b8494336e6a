// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Model listing command

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use tracing::info;

use omnilm_core::application::CompletionService;
use omnilm_core::domain::client_config::ClientConfigManifest;

#[derive(Args, Debug)]
pub struct ModelsArgs {
    /// Only show models under this namespace
    #[arg(long, value_name = "NAMESPACE")]
    pub namespace: Option<String>,
}

pub async fn execute(args: ModelsArgs, config_override: Option<PathBuf>) -> Result<()> {
    let manifest = ClientConfigManifest::load_or_default(config_override)
        .context("Failed to load configuration")?;
    let service = CompletionService::from_manifest(&manifest)?;
    service
        .ensure_defaults()
        .context("Failed to register default providers")?;

    let listing = filter_namespace(service.registry().list_models(), args.namespace.as_deref());
    info!("Listing {} registered models", listing.len());
    if listing.is_empty() {
        println!("{}", "No models registered".yellow());
        return Ok(());
    }

    for (fqn, aliases) in &listing {
        let aliases: Vec<&str> = aliases.iter().map(String::as_str).collect();
        println!("{}  {}", fqn.bold(), aliases.join(", ").dimmed());
    }
    println!();
    println!("{} models", listing.len());

    Ok(())
}

fn filter_namespace(
    listing: BTreeMap<String, BTreeSet<String>>,
    namespace: Option<&str>,
) -> BTreeMap<String, BTreeSet<String>> {
    match namespace {
        Some(namespace) => {
            let prefix = format!("{}/", namespace.trim_end_matches('/'));
            listing
                .into_iter()
                .filter(|(fqn, _)| fqn.starts_with(&prefix))
                .collect()
        }
        None => listing,
    }
}
