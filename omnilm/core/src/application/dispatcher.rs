// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Completion Dispatcher - Concurrent Fan-Out
//
// Expands a (models x prompts) batch into one task per pair and runs them all at
// once. Every task resolves its own model, so a bad name or a failing provider
// only ever produces an error Choice for that slot. Results are collected by
// awaiting the handles in spawn order, which keeps the output positional no
// matter which provider answers first.
//
// Per-call credentials arrive as an overlay of re-keyed providers by namespace.
// The overlay only replaces providers the registry marks as default-built, so a
// later custom registration under the same FQN keeps serving it.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::domain::completion::{Choice, CompletionRequest, GenerationParams};
use crate::domain::llm::LLMError;
use crate::infrastructure::llm::defaults::ProviderOverlay;
use crate::infrastructure::llm::registry::{ProviderRegistry, ResolvedModel};

/// Dispatch-wide limits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSettings {
    /// Timeout applied to each provider call
    pub request_timeout: Option<Duration>,
    /// Maximum number of provider calls in flight (unbounded when `None`)
    pub max_concurrency: Option<usize>,
}

pub struct CompletionDispatcher {
    registry: Arc<ProviderRegistry>,
    permits: Option<Arc<Semaphore>>,
    request_timeout: Option<Duration>,
    overlay: Arc<ProviderOverlay>,
}

impl CompletionDispatcher {
    pub fn new(registry: Arc<ProviderRegistry>, settings: DispatchSettings) -> Self {
        Self {
            registry,
            permits: settings
                .max_concurrency
                .filter(|limit| *limit > 0)
                .map(|limit| Arc::new(Semaphore::new(limit))),
            request_timeout: settings.request_timeout,
            overlay: Arc::new(ProviderOverlay::new()),
        }
    }

    /// Use these providers instead of the default-built ones, for this dispatcher only
    pub fn with_overlay(mut self, overlay: ProviderOverlay) -> Self {
        self.overlay = Arc::new(overlay);
        self
    }

    /// Run every (model, prompt) pair and return one Choice per pair, models outer.
    pub async fn dispatch(
        &self,
        models: &[String],
        prompts: &[String],
        params: &GenerationParams,
    ) -> Vec<Choice> {
        let pairs: Vec<(String, String)> = models
            .iter()
            .flat_map(|model| prompts.iter().map(move |prompt| (model.clone(), prompt.clone())))
            .collect();

        info!(
            "Dispatching {} completion tasks ({} models x {} prompts)",
            pairs.len(),
            models.len(),
            prompts.len()
        );

        let mut handles = Vec::with_capacity(pairs.len());
        for (model, prompt) in &pairs {
            let registry = Arc::clone(&self.registry);
            let permits = self.permits.clone();
            let overlay = Arc::clone(&self.overlay);
            let timeout = self.request_timeout;
            let model = model.clone();
            let prompt = prompt.clone();
            let params = params.clone();

            handles.push(tokio::spawn(async move {
                let _permit = match permits {
                    Some(semaphore) => semaphore.acquire_owned().await.ok(),
                    None => None,
                };
                run_task(&registry, &overlay, model, prompt, params, timeout).await
            }));
        }

        let results = join_all(handles).await;

        let choices: Vec<Choice> = results
            .into_iter()
            .zip(pairs)
            .map(|(result, (model, _))| match result {
                Ok(choice) => choice,
                Err(e) => {
                    warn!("Completion task for '{}' did not finish: {}", model, e);
                    Choice::failed(model, LLMError::TaskFailed(e.to_string()).to_choice_error())
                }
            })
            .collect();

        let failed = choices.iter().filter(|choice| choice.is_error()).count();
        info!(
            "Dispatch finished: {} succeeded, {} failed",
            choices.len() - failed,
            failed
        );

        choices
    }
}

async fn run_task(
    registry: &ProviderRegistry,
    overlay: &ProviderOverlay,
    model: String,
    prompt: String,
    params: GenerationParams,
    timeout: Option<Duration>,
) -> Choice {
    let resolved = match registry.resolve(&model) {
        Ok(resolved) => resolved,
        Err(e) => {
            warn!("Could not resolve model '{}'", model);
            return Choice::failed(model, e.to_choice_error());
        }
    };
    debug!("Resolved '{}' to {}", model, resolved.fqn);

    let ResolvedModel {
        provider,
        fqn,
        model,
        from_defaults,
    } = resolved;
    let keyed = if from_defaults {
        overlay.get(provider.namespace()).cloned()
    } else {
        None
    };
    let provider = keyed.unwrap_or(provider);

    let request = CompletionRequest::new(model, prompt, params);
    let call = provider.create_completion(&request);

    let outcome = match timeout {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .unwrap_or(Err(LLMError::Timeout(limit))),
        None => call.await,
    };

    match outcome {
        Ok(completion) => Choice::completed(fqn, completion),
        Err(e) => {
            warn!("Completion for {} failed: {}", fqn, e);
            Choice::failed(fqn, e.to_choice_error())
        }
    }
}
