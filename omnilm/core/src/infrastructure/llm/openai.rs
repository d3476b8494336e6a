// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// OpenAI Completion Provider Adapter
//
// Anti-Corruption Layer for the OpenAI legacy completions API.
// Also works with OpenAI-compatible servers (vLLM, LM Studio, etc.) by overriding
// the endpoint, namespace and model catalog.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::http::post_json;
use crate::domain::completion::{CompletionRequest, ProviderCompletion, Usage};
use crate::domain::llm::{CompletionProvider, LLMError};

pub const OPENAI_NAMESPACE: &str = "openai.com";
pub const OPENAI_ENDPOINT: &str = "https://api.openai.com/v1/completions";
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

pub const OPENAI_MODELS: &[&str] = &[
    "text-davinci-003",
    "text-davinci-002",
    "text-curie-001",
    "text-babbage-001",
    "text-ada-001",
    // short names
    "ada",
    "babbage",
    "curie",
    "davinci",
];

pub struct OpenAIAdapter {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    models: Vec<String>,
    namespace: String,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: Option<Usage>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    text: String,
}

impl OpenAIAdapter {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: OPENAI_ENDPOINT.to_string(),
            api_key,
            models: OPENAI_MODELS.iter().map(|m| m.to_string()).collect(),
            namespace: OPENAI_NAMESPACE.to_string(),
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_models(mut self, models: Vec<String>) -> Self {
        self.models = models;
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }
}

fn error_message(error: &Value) -> String {
    error
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string())
}

#[async_trait]
impl CompletionProvider for OpenAIAdapter {
    async fn create_completion(
        &self,
        request: &CompletionRequest,
    ) -> Result<ProviderCompletion, LLMError> {
        // The normalized request already matches the completions wire format.
        let response: OpenAIResponse =
            post_json(&self.client, &self.endpoint, self.api_key.as_deref(), request).await?;

        if let Some(error) = &response.error {
            return Err(LLMError::Provider(error_message(error)));
        }

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LLMError::InvalidResponse("No choices in response".into()))?;

        let mut completion = ProviderCompletion::new(choice.text);
        if let Some(usage) = response.usage {
            completion = completion.with_usage(usage);
        }
        if let Some(id) = response.id {
            completion = completion.with_extra(json!({ "id": id }));
        }
        Ok(completion)
    }

    fn list_models(&self) -> Vec<String> {
        self.models.clone()
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }
}
