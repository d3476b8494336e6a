// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Completion Provider Registry - Model Alias Resolution and Provider Management
//
// Holds every registered provider keyed by fully-qualified name (namespace/model)
// and the alias table derived from registrations. Each registration writes three
// kinds of alias: the FQN itself, the bare model name, and the trailing segment of
// org-qualified model names ("bigscience/bloom-560m" -> "bloom-560m").
//
// Collision policy: the newest registration wins for any alias it writes. A bare
// name shared by two providers therefore resolves to whichever registered last,
// while each FQN keeps resolving to its own provider.
//
// The tables are written at startup and read concurrently during dispatch.
// Per-call credentials never write here: the registry only records which FQNs
// are still served by a default-built provider, so dispatch can swap in a
// re-keyed copy for that one call.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use super::defaults::DefaultProviders;
use crate::domain::client_config::{ApiKeys, ConfigError};
use crate::domain::llm::{CompletionProvider, LLMError};

/// A caller-given name resolved to one provider and its canonical model name
#[derive(Clone)]
pub struct ResolvedModel {
    pub provider: Arc<dyn CompletionProvider>,
    /// Fully-qualified name, e.g. "openai.com/ada"
    pub fqn: String,
    /// Model name as the provider knows it (FQN without the namespace prefix)
    pub model: String,
    /// Served by the provider `ensure_defaults` registered, not a later registration
    pub from_defaults: bool,
}

impl fmt::Debug for ResolvedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedModel")
            .field("namespace", &self.provider.namespace())
            .field("fqn", &self.fqn)
            .field("model", &self.model)
            .field("from_defaults", &self.from_defaults)
            .finish()
    }
}

/// Registry for managing completion providers and resolving model aliases
pub struct ProviderRegistry {
    state: RwLock<RegistryState>,
}

#[derive(Default)]
struct RegistryState {
    models: HashMap<String, Arc<dyn CompletionProvider>>, // fqn -> provider
    aliases: HashMap<String, String>,                      // alias -> fqn
    default_fqns: HashSet<String>,
    defaults_registered: bool,
}

impl RegistryState {
    fn insert(&mut self, provider: Arc<dyn CompletionProvider>, from_defaults: bool) {
        let namespace = provider.namespace().to_string();
        let models = provider.list_models();

        for model in &models {
            let fqn = format!("{}/{}", namespace, model);
            self.models.insert(fqn.clone(), Arc::clone(&provider));
            if from_defaults {
                self.default_fqns.insert(fqn.clone());
            } else {
                self.default_fqns.remove(&fqn);
            }
            self.aliases.insert(fqn.clone(), fqn.clone());
            self.claim(model, &fqn);

            if let Some((_, last_segment)) = model.rsplit_once('/') {
                self.claim(last_segment, &fqn);
            }
        }

        info!(
            "Registered provider '{}' with {} models",
            namespace,
            models.len()
        );
    }

    fn claim(&mut self, alias: &str, fqn: &str) {
        if let Some(previous) = self.aliases.insert(alias.to_string(), fqn.to_string()) {
            if previous != fqn {
                debug!("Alias '{}' remapped: {} -> {}", alias, previous, fqn);
            }
        }
    }

    fn reverse_aliases(&self) -> BTreeMap<String, BTreeSet<String>> {
        let mut reverse: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (alias, fqn) in &self.aliases {
            reverse.entry(fqn.clone()).or_default().insert(alias.clone());
        }
        reverse
    }
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
        }
    }

    /// Register a provider under every model it lists
    pub fn register(&self, provider: Arc<dyn CompletionProvider>) {
        self.state.write().insert(provider, false);
    }

    /// Register several providers in order (later entries win alias collisions)
    pub fn register_all(&self, providers: impl IntoIterator<Item = Arc<dyn CompletionProvider>>) {
        let mut state = self.state.write();
        for provider in providers {
            state.insert(provider, false);
        }
    }

    /// Register the built-in provider set once.
    ///
    /// The first successful call registers everything `defaults` describes, with
    /// configured credentials only; `call_keys` merely satisfy the required-key
    /// check. Later calls are no-ops.
    pub fn ensure_defaults(
        &self,
        defaults: &DefaultProviders,
        call_keys: Option<&ApiKeys>,
    ) -> Result<(), ConfigError> {
        if self.state.read().defaults_registered {
            return Ok(());
        }

        let mut state = self.state.write();
        if state.defaults_registered {
            return Ok(());
        }

        let providers = defaults.build(call_keys)?;
        info!("Registering {} default providers", providers.len());
        for provider in providers {
            state.insert(provider, true);
        }
        state.defaults_registered = true;
        Ok(())
    }

    pub fn defaults_registered(&self) -> bool {
        self.state.read().defaults_registered
    }

    /// Resolve a bare name, trailing segment or FQN to its provider
    pub fn resolve(&self, name: &str) -> Result<ResolvedModel, LLMError> {
        let state = self.state.read();

        let resolved = state.aliases.get(name).and_then(|fqn| {
            state.models.get(fqn).map(|provider| {
                let model = fqn
                    .strip_prefix(provider.namespace())
                    .and_then(|rest| rest.strip_prefix('/'))
                    .unwrap_or(fqn)
                    .to_string();
                ResolvedModel {
                    provider: Arc::clone(provider),
                    fqn: fqn.clone(),
                    model,
                    from_defaults: state.default_fqns.contains(fqn),
                }
            })
        });

        resolved.ok_or_else(|| LLMError::ModelNotFound {
            name: name.to_string(),
            known: pretty_list(&state.reverse_aliases()),
        })
    }

    /// FQN -> every alias resolving to it
    pub fn list_models(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.state.read().reverse_aliases()
    }

    /// Get list of available model aliases
    pub fn available_aliases(&self) -> Vec<String> {
        let mut aliases: Vec<String> = self.state.read().aliases.keys().cloned().collect();
        aliases.sort();
        aliases
    }

    /// Check if a model alias exists
    pub fn has_alias(&self, alias: &str) -> bool {
        self.state.read().aliases.contains_key(alias)
    }

    /// Number of registered fully-qualified models
    pub fn model_count(&self) -> usize {
        self.state.read().models.len()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("ProviderRegistry")
            .field("models", &state.models.len())
            .field("aliases", &state.aliases.len())
            .field("defaults_registered", &state.defaults_registered)
            .finish()
    }
}

fn pretty_list(models: &BTreeMap<String, BTreeSet<String>>) -> String {
    models
        .iter()
        .map(|(fqn, aliases)| {
            let aliases: Vec<&str> = aliases.iter().map(String::as_str).collect();
            format!("-> {}: {}", fqn, aliases.join(", "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::completion::{CompletionRequest, ProviderCompletion};
    use async_trait::async_trait;

    struct StaticProvider {
        namespace: &'static str,
        models: Vec<&'static str>,
    }

    #[async_trait]
    impl CompletionProvider for StaticProvider {
        async fn create_completion(
            &self,
            _request: &CompletionRequest,
        ) -> Result<ProviderCompletion, LLMError> {
            Ok(ProviderCompletion::new(self.namespace))
        }

        fn list_models(&self) -> Vec<String> {
            self.models.iter().map(|m| m.to_string()).collect()
        }

        fn namespace(&self) -> &str {
            self.namespace
        }
    }

    fn provider(namespace: &'static str, models: Vec<&'static str>) -> Arc<dyn CompletionProvider> {
        Arc::new(StaticProvider { namespace, models })
    }

    #[test]
    fn test_registry_creation() {
        let registry = ProviderRegistry::new();
        registry.register(provider("ns", vec!["foo"]));

        assert!(registry.has_alias("foo"));
        assert!(registry.has_alias("ns/foo"));
        assert_eq!(registry.available_aliases(), vec!["foo", "ns/foo"]);
        assert_eq!(registry.model_count(), 1);
    }

    #[test]
    fn test_trailing_segment_alias() {
        let registry = ProviderRegistry::new();
        registry.register(provider("huggingface.co", vec!["bigscience/bloom-560m"]));

        for name in ["bloom-560m", "bigscience/bloom-560m", "huggingface.co/bigscience/bloom-560m"] {
            let resolved = registry.resolve(name).unwrap();
            assert_eq!(resolved.fqn, "huggingface.co/bigscience/bloom-560m");
            assert_eq!(resolved.model, "bigscience/bloom-560m");
        }
    }

    #[test]
    fn test_every_alias_points_at_a_registered_model() {
        let registry = ProviderRegistry::new();
        registry.register_all([
            provider("a", vec!["x", "org/y"]),
            provider("b", vec!["x", "z"]),
        ]);

        let state = registry.state.read();
        for fqn in state.aliases.values() {
            assert!(state.models.contains_key(fqn), "dangling alias target {fqn}");
        }
    }

    #[test]
    fn test_unknown_model_lists_known_aliases() {
        let registry = ProviderRegistry::new();
        registry.register(provider("ns", vec!["foo"]));

        let err = registry.resolve("nonexistent-model").unwrap_err();
        match err {
            LLMError::ModelNotFound { name, known } => {
                assert_eq!(name, "nonexistent-model");
                assert_eq!(known, "-> ns/foo: foo, ns/foo");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_later_registration_takes_fqn_from_defaults() {
        let registry = ProviderRegistry::new();
        registry.state.write().insert(provider("local", vec!["m", "n"]), true);
        assert!(registry.resolve("local/m").unwrap().from_defaults);

        registry.register(provider("local", vec!["m"]));

        assert!(!registry.resolve("local/m").unwrap().from_defaults);
        assert!(registry.resolve("local/n").unwrap().from_defaults);
    }
}
