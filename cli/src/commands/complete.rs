// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Batch completion command
//!
//! Every `--model` is paired with every `--prompt`; results come back in that
//! order, one choice per pair.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use omnilm_core::application::CompletionService;
use omnilm_core::domain::client_config::ClientConfigManifest;
use omnilm_core::domain::completion::{CompletionResponse, CreateCompletion, GenerationParams};

#[derive(Args, Debug)]
pub struct CompleteArgs {
    /// Model alias or fully-qualified name (repeatable)
    #[arg(short, long = "model", value_name = "MODEL", required = true)]
    pub models: Vec<String>,

    /// Prompt text (repeatable)
    #[arg(short, long = "prompt", value_name = "PROMPT", required = true)]
    pub prompts: Vec<String>,

    #[arg(long)]
    pub max_tokens: Option<u32>,

    #[arg(long)]
    pub temperature: Option<f32>,

    #[arg(long)]
    pub top_p: Option<f32>,

    /// Stop sequence (repeatable)
    #[arg(long = "stop", value_name = "SEQUENCE")]
    pub stop: Vec<String>,

    #[arg(long)]
    pub suffix: Option<String>,

    #[arg(long)]
    pub n: Option<u32>,

    /// Include the prompt in the returned text
    #[arg(long)]
    pub echo: bool,

    #[arg(long)]
    pub user: Option<String>,

    /// Per-call timeout in milliseconds
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Provider credential as NAMESPACE=KEY (repeatable)
    #[arg(long = "api-key", value_name = "NAMESPACE=KEY", value_parser = parse_api_key)]
    pub api_keys: Vec<(String, String)>,

    /// Print the raw response as JSON
    #[arg(long)]
    pub json: bool,
}

impl CompleteArgs {
    fn params(&self) -> GenerationParams {
        GenerationParams {
            suffix: self.suffix.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            top_p: self.top_p,
            n: self.n,
            echo: self.echo.then_some(true),
            stop: (!self.stop.is_empty()).then(|| self.stop.clone().into()),
            user: self.user.clone(),
            ..Default::default()
        }
    }

    pub fn to_request(&self) -> CreateCompletion {
        let mut request = CreateCompletion::new(self.models.clone(), self.prompts.clone())
            .params(self.params());

        for (namespace, key) in &self.api_keys {
            request = request.api_key(namespace.clone(), key.clone());
        }
        if let Some(ms) = self.timeout_ms {
            request = request.request_timeout(Duration::from_millis(ms));
        }

        request
    }
}

fn parse_api_key(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((namespace, key)) if !namespace.is_empty() && !key.is_empty() => {
            Ok((namespace.to_string(), key.to_string()))
        }
        _ => Err(format!("expected NAMESPACE=KEY, got '{}'", value)),
    }
}

pub async fn execute(args: CompleteArgs, config_override: Option<PathBuf>) -> Result<()> {
    let manifest = ClientConfigManifest::load_or_default(config_override)
        .context("Failed to load configuration")?;
    let service = CompletionService::from_manifest(&manifest)?;

    info!(
        "Running {} models x {} prompts",
        args.models.len(),
        args.prompts.len()
    );
    let response = service
        .create(args.to_request())
        .await
        .context("Completion request could not be dispatched")?;

    let failed = response.choices.iter().filter(|choice| choice.is_error()).count();
    info!(
        "Batch {} finished with {} of {} choices failed",
        response.id,
        failed,
        response.choices.len()
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_summary(&response);
    }

    Ok(())
}

fn print_summary(response: &CompletionResponse) {
    for (index, choice) in response.choices.iter().enumerate() {
        println!("{} {}", format!("[{}]", index).dimmed(), choice.model_name.bold());
        match (choice.text(), choice.error()) {
            (Some(text), _) => println!("{}", text),
            (None, Some(error)) => println!("{}", error.red()),
            (None, None) => {}
        }
        println!();
    }

    let usage = &response.usage;
    println!(
        "{} prompt={} completion={} total={}",
        "Usage:".bold(),
        usage.prompt_tokens,
        usage.completion_tokens,
        usage.total_tokens
    );
}
