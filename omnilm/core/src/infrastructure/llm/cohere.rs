// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Cohere Generate API Adapter
//
// Anti-Corruption Layer for Cohere's /v1/generate endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::http::post_json;
use crate::domain::completion::{CompletionRequest, ProviderCompletion, Usage};
use crate::domain::llm::{CompletionProvider, LLMError};

pub const COHERE_NAMESPACE: &str = "cohere.ai";
pub const COHERE_ENDPOINT: &str = "https://api.cohere.ai/v1/generate";
pub const COHERE_API_KEY_ENV: &str = "COHERE_API_KEY";

pub const COHERE_MODELS: &[&str] = &[
    "command",
    "command-nightly",
    "command-light",
    "command-light-nightly",
];

pub struct CohereAdapter {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    models: Vec<String>,
    namespace: String,
}

#[derive(Serialize)]
struct CohereRequest<'a> {
    prompt: &'a str,
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct CohereResponse {
    id: String,
    generations: Vec<CohereGeneration>,
    #[serde(default)]
    meta: Option<CohereMeta>,
}

#[derive(Deserialize)]
struct CohereGeneration {
    id: String,
    text: String,
}

#[derive(Deserialize)]
struct CohereMeta {
    #[serde(default)]
    billed_units: Option<CohereBilledUnits>,
}

#[derive(Deserialize)]
struct CohereBilledUnits {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

impl CohereAdapter {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: COHERE_ENDPOINT.to_string(),
            api_key,
            models: COHERE_MODELS.iter().map(|m| m.to_string()).collect(),
            namespace: COHERE_NAMESPACE.to_string(),
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

#[async_trait]
impl CompletionProvider for CohereAdapter {
    async fn create_completion(
        &self,
        request: &CompletionRequest,
    ) -> Result<ProviderCompletion, LLMError> {
        let params = &request.params;
        let body = CohereRequest {
            prompt: &request.prompt,
            model: &request.model,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            p: params.top_p,
            frequency_penalty: params.frequency_penalty,
            presence_penalty: params.presence_penalty,
            stop_sequences: params.stop.as_ref().map(|stop| stop.to_vec()),
        };

        let response: CohereResponse =
            post_json(&self.client, &self.endpoint, self.api_key.as_deref(), &body).await?;

        let generation = response
            .generations
            .into_iter()
            .next()
            .ok_or_else(|| LLMError::InvalidResponse("No generations in response".into()))?;

        let mut completion = ProviderCompletion::new(generation.text).with_extra(json!({
            "request_id": response.id,
            "generation_id": generation.id,
        }));

        if let Some(units) = response.meta.and_then(|meta| meta.billed_units) {
            completion = completion.with_usage(Usage::new(
                units.input_tokens,
                units.output_tokens,
                units.input_tokens + units.output_tokens,
            ));
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
