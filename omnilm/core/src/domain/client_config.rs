// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Client Configuration Types
//
// Defines the configuration schema for the omnilm client, including:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Per-namespace API keys (literal or "env:VAR_NAME")
// - Built-in provider registration policy
// - Additional provider endpoints (self-hosted OpenAI-compatible servers etc.)
// - Dispatch settings (per-task timeout, parallelism bound)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const API_VERSION: &str = "omnilm/v1";
pub const KIND: &str = "ClientConfig";
pub const CONFIG_PATH_ENV: &str = "OMNILM_CONFIG_PATH";

/// Namespace → API key
pub type ApiKeys = HashMap<String, String>;

/// Fatal configuration problems, raised before any completion is dispatched
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{env_var} is not set or passed as an API key for '{namespace}'")]
    MissingCredential { namespace: String, env_var: String },

    #[error("Environment variable not set: {0}")]
    MissingEnvVar(String),

    #[error("Invalid provider configuration: {0}")]
    InvalidProvider(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Top-level Kubernetes-style client configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfigManifest {
    /// API version (must be "omnilm/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "ClientConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    #[serde(default)]
    pub spec: ClientConfigSpec,
}

/// Manifest metadata (Kubernetes-style)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfigSpec {
    /// API keys per namespace (supports "env:VAR_NAME")
    #[serde(default)]
    pub api_keys: HashMap<String, String>,

    /// Built-in provider registration
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Extra providers registered after the built-ins
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,

    #[serde(default)]
    pub dispatch: DispatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Register the built-in OpenAI, Hugging Face and Cohere adapters
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Namespaces whose credential must be present at registration time
    #[serde(default = "default_required_namespaces")]
    pub required: Vec<String>,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            required: default_required_namespaces(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    #[serde(alias = "openai-compatible")]
    OpenAI,
    HuggingFace,
    Cohere,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Namespace used to build FQNs (e.g. "local-vllm")
    pub namespace: String,

    #[serde(rename = "type")]
    pub provider_type: ProviderType,

    /// API endpoint URL (defaults to the vendor endpoint for the type)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// API key (supports "env:VAR_NAME" for environment variables)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Model catalog served under this namespace
    pub models: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Per-task timeout in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_ms: Option<u64>,

    /// Upper bound on concurrently running tasks (unbounded when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrency: Option<usize>,
}

impl DispatchConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

fn default_true() -> bool {
    true
}

fn default_required_namespaces() -> Vec<String> {
    vec!["openai.com".to_string()]
}

impl Default for ClientConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "omnilm".to_string(),
                version: Some("1.0.0".to_string()),
                labels: None,
            },
            spec: ClientConfigSpec::default(),
        }
    }
}

/// Resolve a secret reference ("env:VAR_NAME" or a literal value)
pub fn resolve_secret(
    value: &str,
    env: impl Fn(&str) -> Option<String>,
) -> Result<String, ConfigError> {
    match value.strip_prefix("env:") {
        Some(var_name) => env(var_name).ok_or_else(|| ConfigError::MissingEnvVar(var_name.to_string())),
        None => Ok(value.to_string()),
    }
}

/// Process environment lookup
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

impl ClientConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Discover configuration file using precedence order
    /// 1. OMNILM_CONFIG_PATH environment variable
    /// 2. ./omnilm-config.yaml (working directory)
    /// 3. ~/.omnilm/config.yaml (user home)
    /// 4. /etc/omnilm/config.yaml (system, Unix) or C:\ProgramData\omnilm\config.yaml (Windows)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./omnilm-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".omnilm").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        let system_config = PathBuf::from("/etc/omnilm/config.yaml");
        #[cfg(windows)]
        let system_config = PathBuf::from("C:\\ProgramData\\omnilm\\config.yaml");

        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            Self::from_yaml_file(&path)?
        } else if let Some(path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", path);
            Self::from_yaml_file(path)?
        } else {
            tracing::debug!("No configuration file found in standard locations. Using defaults.");
            Self::default()
        };

        config.apply_env_overrides(process_env);
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(val) = env("OMNILM_REQUEST_TIMEOUT_MS") {
            match val.parse::<u64>() {
                Ok(ms) => {
                    tracing::info!("Environment override: OMNILM_REQUEST_TIMEOUT_MS={}", ms);
                    self.spec.dispatch.request_timeout_ms = Some(ms);
                }
                Err(_) => tracing::warn!(
                    "Invalid value for OMNILM_REQUEST_TIMEOUT_MS: '{}'. Expected milliseconds. Ignoring.",
                    val
                ),
            }
        }

        if let Some(val) = env("OMNILM_MAX_CONCURRENCY") {
            match val.parse::<usize>() {
                Ok(limit) => {
                    tracing::info!("Environment override: OMNILM_MAX_CONCURRENCY={}", limit);
                    self.spec.dispatch.max_concurrency = Some(limit);
                }
                Err(_) => tracing::warn!(
                    "Invalid value for OMNILM_MAX_CONCURRENCY: '{}'. Expected a positive integer. Ignoring.",
                    val
                ),
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_version != API_VERSION {
            return Err(ConfigError::Invalid(format!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version, API_VERSION
            )));
        }

        if self.kind != KIND {
            return Err(ConfigError::Invalid(format!(
                "Invalid kind: '{}'. Must be '{}'",
                self.kind, KIND
            )));
        }

        if self.metadata.name.is_empty() {
            return Err(ConfigError::Invalid("metadata.name cannot be empty".to_string()));
        }

        let mut seen = std::collections::HashSet::new();
        for provider in &self.spec.providers {
            if provider.namespace.is_empty() {
                return Err(ConfigError::InvalidProvider(
                    "provider namespace cannot be empty".to_string(),
                ));
            }

            if provider.namespace.contains('/') {
                return Err(ConfigError::InvalidProvider(format!(
                    "provider namespace cannot contain '/': {}",
                    provider.namespace
                )));
            }

            if !seen.insert(provider.namespace.as_str()) {
                return Err(ConfigError::InvalidProvider(format!(
                    "duplicate provider namespace: {}",
                    provider.namespace
                )));
            }

            if matches!(provider.endpoint.as_deref(), Some("")) {
                return Err(ConfigError::InvalidProvider(format!(
                    "provider endpoint cannot be empty for: {}",
                    provider.namespace
                )));
            }

            if provider.models.is_empty() {
                return Err(ConfigError::InvalidProvider(format!(
                    "provider must have at least one model: {}",
                    provider.namespace
                )));
            }

            if provider.models.iter().any(String::is_empty) {
                return Err(ConfigError::InvalidProvider(format!(
                    "model name cannot be empty in provider: {}",
                    provider.namespace
                )));
            }
        }

        if self.spec.dispatch.max_concurrency == Some(0) {
            return Err(ConfigError::Invalid(
                "dispatch.max_concurrency must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
