// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Hugging Face Inference API Adapter
//
// Anti-Corruption Layer for hosted text-generation models. The model id is part
// of the URL, so org-qualified ids ("bigscience/bloom-560m") map to nested paths.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::http::post_json;
use crate::domain::completion::{CompletionRequest, ProviderCompletion};
use crate::domain::llm::{CompletionProvider, LLMError};

pub const HUGGINGFACE_NAMESPACE: &str = "huggingface.co";
pub const HUGGINGFACE_ENDPOINT: &str = "https://api-inference.huggingface.co/models";
pub const HUGGINGFACE_API_KEY_ENV: &str = "HF_API_TOKEN";

pub const HUGGINGFACE_MODELS: &[&str] = &[
    "gpt2",
    "distilgpt2",
    "gpt2-large",
    "gpt2-medium",
    "gpt2-xl",
    "bigscience/bloom-560m",
    "bigscience/bloom-1b",
    "bigscience/bloom-3b",
    "bigscience/bloom-7b1",
    "decapoda-research/llama-7b-hf",
    "decapoda-research/llama-13b-hf",
    "decapoda-research/llama-30b-hf",
    "decapoda-research/llama-65b-hf",
    "EleutherAI/gpt-j-6B",
    "EleutherAI/gpt-j-2.7B",
    "EleutherAI/gpt-neo-125M",
    "EleutherAI/gpt-neo-1.3B",
    "EleutherAI/gpt-neox-20B",
    "EleutherAI/pythia-160m",
    "EleutherAI/pythia-70m",
    "EleutherAI/pythia-12b",
    "cerebras/Cerebras-GPT-111M",
    "cerebras/Cerebras-GPT-1.3B",
    "cerebras/Cerebras-GPT-2.7B",
    "bigcode/santacoder",
    "Salesforce/codegen-350M-multi",
    "Salesforce/codegen-2b-multi",
    "stabilityai/stablelm-tuned-alpha-3b",
    "stabilityai/stablelm-tuned-alpha-7b",
    "facebook/opt-125m",
    "facebook/opt-350m",
    "facebook/opt-1.3b",
    "facebook/opt-2.7b",
    "facebook/opt-6.7b",
    "facebook/opt-13b",
    "facebook/opt-30b",
    "mosaicml/mpt-7b",
    "mosaicml/mpt-7b-instruct",
    "databricks/dolly-v2-7b",
    "databricks/dolly-v2-12b",
];

pub struct HuggingFaceAdapter {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    models: Vec<String>,
    namespace: String,
}

#[derive(Serialize)]
struct HuggingFaceRequest<'a> {
    inputs: &'a str,
    #[serde(skip_serializing_if = "HuggingFaceParameters::is_empty")]
    parameters: HuggingFaceParameters,
}

#[derive(Serialize)]
struct HuggingFaceParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_new_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    return_full_text: Option<bool>,
}

impl HuggingFaceParameters {
    fn is_empty(&self) -> bool {
        self.top_p.is_none()
            && self.temperature.is_none()
            && self.max_new_tokens.is_none()
            && self.return_full_text.is_none()
    }
}

#[derive(Deserialize)]
struct HuggingFaceGeneration {
    generated_text: String,
}

impl HuggingFaceAdapter {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: HUGGINGFACE_ENDPOINT.to_string(),
            api_key,
            models: HUGGINGFACE_MODELS.iter().map(|m| m.to_string()).collect(),
            namespace: HUGGINGFACE_NAMESPACE.to_string(),
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
impl CompletionProvider for HuggingFaceAdapter {
    async fn create_completion(
        &self,
        request: &CompletionRequest,
    ) -> Result<ProviderCompletion, LLMError> {
        let params = &request.params;
        let body = HuggingFaceRequest {
            inputs: &request.prompt,
            parameters: HuggingFaceParameters {
                top_p: params.top_p,
                temperature: params.temperature,
                max_new_tokens: params.max_tokens,
                return_full_text: params.echo,
            },
        };

        let url = format!("{}/{}", self.endpoint.trim_end_matches('/'), request.model);
        let generations: Vec<HuggingFaceGeneration> =
            post_json(&self.client, &url, self.api_key.as_deref(), &body).await?;

        generations
            .into_iter()
            .next()
            .map(|generation| ProviderCompletion::new(generation.generated_text))
            .ok_or_else(|| LLMError::InvalidResponse("No generations in response".into()))
    }

    fn list_models(&self) -> Vec<String> {
        self.models.clone()
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }
}
