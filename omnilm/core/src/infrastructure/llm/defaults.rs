// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Default Provider Set
//
// Describes the built-in adapters (OpenAI, Hugging Face, Cohere) plus any extra
// providers from the client manifest, and builds them on demand.
//
// Registered providers carry only configured credentials:
//   1. the provider's own `api_key` in the manifest (literal or "env:VAR_NAME")
//   2. manifest spec.api_keys for its namespace
//   3. the provider's conventional environment variable
// Per-call api_keys never reach the registry; `overlay` builds short-lived
// providers for one call instead.
//
// An "env:" reference whose variable is unset counts as no credential. A
// namespace listed in `required` with no credential, and no per-call key, is a
// configuration error.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::cohere::{CohereAdapter, COHERE_API_KEY_ENV, COHERE_NAMESPACE};
use super::huggingface::{HuggingFaceAdapter, HUGGINGFACE_API_KEY_ENV, HUGGINGFACE_NAMESPACE};
use super::openai::{OpenAIAdapter, OPENAI_API_KEY_ENV, OPENAI_NAMESPACE};
use crate::domain::client_config::{
    process_env, resolve_secret, ApiKeys, ClientConfigManifest, ConfigError, ProviderConfig,
    ProviderType,
};
use crate::domain::llm::CompletionProvider;

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Namespace -> provider built with a per-call key
pub type ProviderOverlay = HashMap<String, Arc<dyn CompletionProvider>>;

const BUILTIN_PROVIDERS: &[(ProviderType, &str, &str)] = &[
    (ProviderType::OpenAI, OPENAI_NAMESPACE, OPENAI_API_KEY_ENV),
    (ProviderType::HuggingFace, HUGGINGFACE_NAMESPACE, HUGGINGFACE_API_KEY_ENV),
    (ProviderType::Cohere, COHERE_NAMESPACE, COHERE_API_KEY_ENV),
];

/// One provider to instantiate
struct ProviderSpec {
    provider_type: ProviderType,
    namespace: String,
    endpoint: Option<String>,
    models: Option<Vec<String>>,
    api_key_ref: Option<String>,
    env_var: Option<&'static str>,
}

/// Outcome of looking up a configured credential
struct ConfiguredKey {
    key: Option<String>,
    /// First "env:" variable that was referenced but unset
    missing_var: Option<String>,
}

/// Recipe for the providers registered on first use
#[derive(Clone)]
pub struct DefaultProviders {
    client: reqwest::Client,
    builtin: bool,
    api_keys: ApiKeys,
    required: Vec<String>,
    providers: Vec<ProviderConfig>,
    env: EnvLookup,
}

impl DefaultProviders {
    /// Built-in providers, OpenAI credential required, keys from the process environment
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            builtin: true,
            api_keys: ApiKeys::new(),
            required: vec![OPENAI_NAMESPACE.to_string()],
            providers: Vec::new(),
            env: Arc::new(process_env),
        }
    }

    pub fn from_manifest(manifest: &ClientConfigManifest) -> Self {
        let spec = &manifest.spec;
        Self {
            builtin: spec.defaults.enabled,
            api_keys: spec.api_keys.clone(),
            required: spec.defaults.required.clone(),
            providers: spec.providers.clone(),
            ..Self::new()
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_api_keys(mut self, api_keys: ApiKeys) -> Self {
        self.api_keys = api_keys;
        self
    }

    pub fn with_required(mut self, namespaces: Vec<String>) -> Self {
        self.required = namespaces;
        self
    }

    pub fn with_providers(mut self, providers: Vec<ProviderConfig>) -> Self {
        self.providers = providers;
        self
    }

    pub fn without_builtin(mut self) -> Self {
        self.builtin = false;
        self
    }

    /// Replace the environment lookup (tests inject a fixed map here)
    pub fn with_env<F>(mut self, env: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Arc::new(env);
        self
    }

    /// Build every enabled provider with its configured credential, built-ins first
    /// so configured providers win collisions.
    ///
    /// `call_keys` only count towards the `required` check; they are never baked
    /// into the returned providers.
    pub fn build(
        &self,
        call_keys: Option<&ApiKeys>,
    ) -> Result<Vec<Arc<dyn CompletionProvider>>, ConfigError> {
        self.check_required(call_keys)?;

        self.specs()
            .into_iter()
            .map(|spec| {
                let configured = self.configured_key(&spec);
                self.instantiate(spec, configured.key)
            })
            .collect()
    }

    /// Fail when a required namespace has neither a configured nor a per-call key
    pub fn check_required(&self, call_keys: Option<&ApiKeys>) -> Result<(), ConfigError> {
        for spec in self.specs() {
            if !self.required.iter().any(|ns| ns == &spec.namespace) {
                continue;
            }
            if call_keys.is_some_and(|keys| keys.contains_key(&spec.namespace)) {
                continue;
            }

            let configured = self.configured_key(&spec);
            if configured.key.is_none() {
                let env_var = configured
                    .missing_var
                    .or_else(|| spec.env_var.map(str::to_string))
                    .unwrap_or_else(|| "api_key".to_string());
                return Err(ConfigError::MissingCredential {
                    namespace: spec.namespace,
                    env_var,
                });
            }
        }
        Ok(())
    }

    /// Providers for the namespaces in `call_keys`, keyed by namespace, for one call only
    pub fn overlay(&self, call_keys: &ApiKeys) -> ProviderOverlay {
        let mut overlay = ProviderOverlay::new();
        for spec in self.specs() {
            if let Some(key) = call_keys.get(&spec.namespace) {
                let namespace = spec.namespace.clone();
                match self.instantiate(spec, Some(key.clone())) {
                    Ok(provider) => {
                        overlay.insert(namespace, provider);
                    }
                    Err(e) => warn!("Could not apply per-call key for '{}': {}", namespace, e),
                }
            }
        }
        debug!("Per-call credentials for {} namespaces", overlay.len());
        overlay
    }

    fn specs(&self) -> Vec<ProviderSpec> {
        let mut specs = Vec::new();

        if self.builtin {
            for (provider_type, namespace, env_var) in BUILTIN_PROVIDERS {
                specs.push(ProviderSpec {
                    provider_type: *provider_type,
                    namespace: namespace.to_string(),
                    endpoint: None,
                    models: None,
                    api_key_ref: None,
                    env_var: Some(*env_var),
                });
            }
        }

        for config in &self.providers {
            if !config.enabled {
                info!("Provider '{}' disabled, skipping", config.namespace);
                continue;
            }
            specs.push(ProviderSpec {
                provider_type: config.provider_type,
                namespace: config.namespace.clone(),
                endpoint: config.endpoint.clone(),
                models: Some(config.models.clone()),
                api_key_ref: config.api_key.clone(),
                env_var: None,
            });
        }

        specs
    }

    fn configured_key(&self, spec: &ProviderSpec) -> ConfiguredKey {
        let mut missing_var = None;
        let references = spec
            .api_key_ref
            .as_deref()
            .into_iter()
            .chain(self.api_keys.get(&spec.namespace).map(String::as_str));

        for reference in references {
            match resolve_secret(reference, |name| (self.env)(name)) {
                Ok(key) => {
                    return ConfiguredKey {
                        key: Some(key),
                        missing_var,
                    }
                }
                Err(ConfigError::MissingEnvVar(var)) => {
                    warn!("Configured key for '{}' references unset {}", spec.namespace, var);
                    missing_var.get_or_insert(var);
                }
                Err(e) => warn!("Ignoring configured key for '{}': {}", spec.namespace, e),
            }
        }

        ConfiguredKey {
            key: spec.env_var.and_then(|var| (self.env)(var)),
            missing_var,
        }
    }

    fn instantiate(
        &self,
        spec: ProviderSpec,
        api_key: Option<String>,
    ) -> Result<Arc<dyn CompletionProvider>, ConfigError> {
        if spec.models.as_ref().is_some_and(Vec::is_empty) {
            return Err(ConfigError::InvalidProvider(format!(
                "provider must have at least one model: {}",
                spec.namespace
            )));
        }
        if api_key.is_none() {
            warn!("No API key for provider '{}'; requests will be unauthenticated", spec.namespace);
        }

        let client = self.client.clone();
        let provider: Arc<dyn CompletionProvider> = match spec.provider_type {
            ProviderType::OpenAI => {
                let mut adapter = OpenAIAdapter::new(api_key)
                    .with_client(client)
                    .with_namespace(spec.namespace);
                if let Some(endpoint) = spec.endpoint {
                    adapter = adapter.with_endpoint(endpoint);
                }
                if let Some(models) = spec.models {
                    adapter = adapter.with_models(models);
                }
                Arc::new(adapter)
            }
            ProviderType::HuggingFace => {
                let mut adapter = HuggingFaceAdapter::new(api_key)
                    .with_client(client)
                    .with_namespace(spec.namespace);
                if let Some(endpoint) = spec.endpoint {
                    adapter = adapter.with_endpoint(endpoint);
                }
                if let Some(models) = spec.models {
                    adapter = adapter.with_models(models);
                }
                Arc::new(adapter)
            }
            ProviderType::Cohere => {
                let mut adapter = CohereAdapter::new(api_key)
                    .with_client(client)
                    .with_namespace(spec.namespace);
                if let Some(endpoint) = spec.endpoint {
                    adapter = adapter.with_endpoint(endpoint);
                }
                if let Some(models) = spec.models {
                    adapter = adapter.with_models(models);
                }
                Arc::new(adapter)
            }
        };

        Ok(provider)
    }
}

impl Default for DefaultProviders {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DefaultProviders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut namespaces: Vec<&str> = Vec::new();
        if self.builtin {
            namespaces.extend(BUILTIN_PROVIDERS.iter().map(|(_, ns, _)| *ns));
        }
        namespaces.extend(self.providers.iter().map(|p| p.namespace.as_str()));
        f.debug_struct("DefaultProviders")
            .field("namespaces", &namespaces)
            .field("required", &self.required)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_with(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> + Send + Sync {
        move |name| {
            pairs
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
        }
    }

    fn namespaces(providers: &[Arc<dyn CompletionProvider>]) -> Vec<String> {
        providers.iter().map(|p| p.namespace().to_string()).collect()
    }

    #[test]
    fn missing_required_credential_fails_fast() {
        let defaults = DefaultProviders::new().with_env(env_with(&[]));
        let err = defaults.build(None).err().unwrap();
        assert!(matches!(
            err,
            ConfigError::MissingCredential { ref namespace, ref env_var }
                if namespace == "openai.com" && env_var == "OPENAI_API_KEY"
        ));
        assert_eq!(
            err.to_string(),
            "OPENAI_API_KEY is not set or passed as an API key for 'openai.com'"
        );
    }

    #[test]
    fn optional_providers_build_without_keys() {
        let defaults = DefaultProviders::new().with_env(env_with(&[("OPENAI_API_KEY", "sk-env")]));
        let providers = defaults.build(None).unwrap();
        assert_eq!(
            namespaces(&providers),
            vec!["openai.com", "huggingface.co", "cohere.ai"]
        );
    }

    #[test]
    fn override_keys_satisfy_required_namespace() {
        let defaults = DefaultProviders::new().with_env(env_with(&[]));
        let mut keys = ApiKeys::new();
        keys.insert("openai.com".to_string(), "sk-call".to_string());

        assert!(defaults.build(Some(&keys)).is_ok());
    }

    #[test]
    fn configured_env_reference_is_resolved() {
        let mut keys = ApiKeys::new();
        keys.insert("openai.com".to_string(), "env:MY_OPENAI".to_string());
        let defaults = DefaultProviders::new()
            .with_api_keys(keys)
            .with_env(env_with(&[("MY_OPENAI", "sk-config")]));

        assert!(defaults.build(None).is_ok());
    }

    #[test]
    fn configured_providers_follow_builtins() {
        let defaults = DefaultProviders::new()
            .with_env(env_with(&[("OPENAI_API_KEY", "sk-env")]))
            .with_providers(vec![
                ProviderConfig {
                    namespace: "local-vllm".to_string(),
                    provider_type: ProviderType::OpenAI,
                    endpoint: Some("http://localhost:8000/v1/completions".to_string()),
                    api_key: None,
                    enabled: true,
                    models: vec!["mistral-7b".to_string()],
                },
                ProviderConfig {
                    namespace: "disabled".to_string(),
                    provider_type: ProviderType::Cohere,
                    endpoint: None,
                    api_key: None,
                    enabled: false,
                    models: vec!["command".to_string()],
                },
            ]);

        let providers = defaults.build(None).unwrap();
        assert_eq!(
            namespaces(&providers),
            vec!["openai.com", "huggingface.co", "cohere.ai", "local-vllm"]
        );
        assert_eq!(providers[3].list_models(), vec!["mistral-7b".to_string()]);
    }

    fn private_provider(required: bool) -> DefaultProviders {
        let defaults = DefaultProviders::new()
            .without_builtin()
            .with_env(env_with(&[]))
            .with_providers(vec![ProviderConfig {
                namespace: "private".to_string(),
                provider_type: ProviderType::HuggingFace,
                endpoint: None,
                api_key: Some("env:PRIVATE_TOKEN".to_string()),
                enabled: true,
                models: vec!["gpt2".to_string()],
            }]);
        if required {
            defaults.with_required(vec!["private".to_string()])
        } else {
            defaults.with_required(Vec::new())
        }
    }

    #[test]
    fn unset_env_reference_on_optional_provider_builds_unauthenticated() {
        let providers = private_provider(false).build(None).unwrap();
        assert_eq!(namespaces(&providers), vec!["private"]);
    }

    #[test]
    fn unset_env_reference_on_required_provider_names_the_variable() {
        let err = private_provider(true).build(None).err().unwrap();
        assert!(matches!(
            err,
            ConfigError::MissingCredential { ref namespace, ref env_var }
                if namespace == "private" && env_var == "PRIVATE_TOKEN"
        ));
    }

    #[test]
    fn unset_env_reference_in_api_keys_follows_the_same_policy() {
        let mut keys = ApiKeys::new();
        keys.insert("openai.com".to_string(), "env:MY_OPENAI".to_string());
        let defaults = DefaultProviders::new().with_api_keys(keys).with_env(env_with(&[]));

        assert!(matches!(
            defaults.build(None),
            Err(ConfigError::MissingCredential { env_var, .. }) if env_var == "MY_OPENAI"
        ));
        assert!(defaults.with_required(Vec::new()).build(None).is_ok());
    }

    #[test]
    fn check_required_accepts_call_keys() {
        let defaults = DefaultProviders::new().with_env(env_with(&[]));
        let mut keys = ApiKeys::new();
        keys.insert("openai.com".to_string(), "sk-call".to_string());

        assert!(defaults.check_required(None).is_err());
        assert!(defaults.check_required(Some(&keys)).is_ok());
    }

    #[test]
    fn overlay_covers_only_keyed_namespaces() {
        let defaults = DefaultProviders::new().with_env(env_with(&[("OPENAI_API_KEY", "sk-env")]));
        let mut keys = ApiKeys::new();
        keys.insert("cohere.ai".to_string(), "co-call".to_string());
        keys.insert("unknown.example".to_string(), "ignored".to_string());

        let overlay = defaults.overlay(&keys);
        assert_eq!(overlay.len(), 1);
        assert_eq!(overlay["cohere.ai"].namespace(), "cohere.ai");
    }
}
