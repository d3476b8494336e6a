// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Completion Service - Top-level entry point
//
// Ties the registry, the default provider set, the dispatcher and the aggregator
// together. Only configuration problems surface as `Err`; everything that goes
// wrong inside a single (model, prompt) task is reported in its Choice.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use super::aggregator::aggregate;
use super::dispatcher::{CompletionDispatcher, DispatchSettings};
use crate::domain::client_config::{ClientConfigManifest, ConfigError, DispatchConfig};
use crate::domain::completion::{CompletionResponse, CreateCompletion};
use crate::domain::llm::CompletionProvider;
use crate::infrastructure::llm::defaults::{DefaultProviders, ProviderOverlay};
use crate::infrastructure::llm::registry::ProviderRegistry;

pub struct CompletionService {
    registry: Arc<ProviderRegistry>,
    defaults: Option<DefaultProviders>,
    dispatch: DispatchConfig,
}

impl CompletionService {
    /// Service over caller-registered providers only
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self {
            registry,
            defaults: None,
            dispatch: DispatchConfig::default(),
        }
    }

    /// Service that registers `defaults` on the first `create` call
    pub fn with_defaults(registry: Arc<ProviderRegistry>, defaults: DefaultProviders) -> Self {
        Self {
            defaults: Some(defaults),
            ..Self::new(registry)
        }
    }

    /// Build a service from a validated client manifest
    pub fn from_manifest(manifest: &ClientConfigManifest) -> Result<Self> {
        manifest
            .validate()
            .context("Client configuration is invalid")?;

        let service = Self::with_defaults(
            Arc::new(ProviderRegistry::new()),
            DefaultProviders::from_manifest(manifest),
        )
        .with_dispatch(manifest.spec.dispatch.clone());

        info!("Completion service configured from '{}'", manifest.metadata.name);
        Ok(service)
    }

    pub fn with_dispatch(mut self, dispatch: DispatchConfig) -> Self {
        self.dispatch = dispatch;
        self
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    /// Register an additional provider; it wins alias collisions with anything earlier
    pub fn register(&self, provider: Arc<dyn CompletionProvider>) {
        self.registry.register(provider);
    }

    pub fn register_all(&self, providers: impl IntoIterator<Item = Arc<dyn CompletionProvider>>) {
        self.registry.register_all(providers);
    }

    /// Register the default providers now instead of on the first `create`
    pub fn ensure_defaults(&self) -> Result<(), ConfigError> {
        match &self.defaults {
            Some(defaults) => self.registry.ensure_defaults(defaults, None),
            None => Ok(()),
        }
    }

    /// Run a completion batch: one Choice per (model, prompt), models outer.
    ///
    /// `request.api_keys` apply to this call only; the shared registry keeps its
    /// configured credentials.
    pub async fn create(&self, request: CreateCompletion) -> Result<CompletionResponse, ConfigError> {
        let call_keys = request.api_keys.as_ref();

        let overlay = match &self.defaults {
            Some(defaults) => {
                defaults.check_required(call_keys)?;
                self.registry.ensure_defaults(defaults, call_keys)?;
                call_keys
                    .filter(|keys| !keys.is_empty())
                    .map(|keys| defaults.overlay(keys))
                    .unwrap_or_default()
            }
            None => ProviderOverlay::new(),
        };

        let settings = DispatchSettings {
            request_timeout: request
                .request_timeout
                .or_else(|| self.dispatch.request_timeout()),
            max_concurrency: self.dispatch.max_concurrency,
        };

        let models = request.model.into_vec();
        let prompts = request.prompt.into_vec();

        let choices = CompletionDispatcher::new(Arc::clone(&self.registry), settings)
            .with_overlay(overlay)
            .dispatch(&models, &prompts, &request.params)
            .await;

        Ok(aggregate(choices))
    }
}
