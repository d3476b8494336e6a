// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Completion Value Types - OpenAI-compatible request/response contract
//
// Everything here is created fresh per call and never persisted. Optional
// generation parameters are skipped during serialization so that an unset
// parameter is omitted from provider payloads instead of being sent as null.

use std::collections::BTreeMap;
use std::iter::Sum;
use std::ops::AddAssign;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::client_config::ApiKeys;

/// Object tag carried by every aggregated response
pub const TEXT_COMPLETION_OBJECT: &str = "text_completion";

/// A single string or a list of strings.
///
/// Used for model and prompt inputs (normalized to a list before dispatch) and for
/// `stop`, which providers accept in either form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.clone().into_vec()
    }
}

impl From<&str> for OneOrMany {
    fn from(value: &str) -> Self {
        OneOrMany::One(value.to_string())
    }
}

impl From<String> for OneOrMany {
    fn from(value: String) -> Self {
        OneOrMany::One(value)
    }
}

impl From<Vec<String>> for OneOrMany {
    fn from(values: Vec<String>) -> Self {
        OneOrMany::Many(values)
    }
}

impl From<Vec<&str>> for OneOrMany {
    fn from(values: Vec<&str>) -> Self {
        OneOrMany::Many(values.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for OneOrMany {
    fn from(values: [&str; N]) -> Self {
        OneOrMany::Many(values.iter().map(|v| v.to_string()).collect())
    }
}

/// Generation parameters shared by every task of a batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,

    /// Forwarded as-is; streamed delivery is not supported by the aggregator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logprobs: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub echo: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<OneOrMany>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_of: Option<u32>,

    /// Token id → bias
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logit_bias: Option<BTreeMap<String, f32>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

/// Normalized request for one model and one prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    #[serde(flatten)]
    pub params: GenerationParams,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>, params: GenerationParams) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            params,
        }
    }
}

/// Token usage stats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl Usage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64, total_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens,
        }
    }
}

impl AddAssign<&Usage> for Usage {
    fn add_assign(&mut self, other: &Usage) {
        self.prompt_tokens = self.prompt_tokens.saturating_add(other.prompt_tokens);
        self.completion_tokens = self.completion_tokens.saturating_add(other.completion_tokens);
        self.total_tokens = self.total_tokens.saturating_add(other.total_tokens);
    }
}

impl<'a> Sum<&'a Usage> for Usage {
    fn sum<I: Iterator<Item = &'a Usage>>(iter: I) -> Self {
        iter.fold(Usage::default(), |mut total, usage| {
            total += usage;
            total
        })
    }
}

/// Normalized result returned by a provider adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderCompletion {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    /// Provider-specific metadata (response ids and the like)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

impl ProviderCompletion {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: None,
            extra: None,
        }
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }

    pub fn with_extra(mut self, extra: Value) -> Self {
        self.extra = Some(extra);
        self
    }
}

/// Either the completion payload or the error that replaced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChoiceOutcome {
    Completed {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        usage: Option<Usage>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        extra: Option<Value>,
    },
    Failed {
        error: String,
    },
}

/// Result of one (model, prompt) attempt within a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub id: String,
    /// Resolved FQN, or the requested name when resolution failed
    pub model_name: String,
    pub created: i64,
    #[serde(flatten)]
    pub outcome: ChoiceOutcome,
}

impl Choice {
    pub fn completed(model_name: impl Into<String>, completion: ProviderCompletion) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            model_name: model_name.into(),
            created: unix_now(),
            outcome: ChoiceOutcome::Completed {
                text: completion.text,
                usage: completion.usage,
                extra: completion.extra,
            },
        }
    }

    pub fn failed(model_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            model_name: model_name.into(),
            created: unix_now(),
            outcome: ChoiceOutcome::Failed {
                error: error.into(),
            },
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.outcome {
            ChoiceOutcome::Completed { text, .. } => Some(text),
            ChoiceOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            ChoiceOutcome::Failed { error } => Some(error),
            ChoiceOutcome::Completed { .. } => None,
        }
    }

    pub fn usage(&self) -> Option<&Usage> {
        match &self.outcome {
            ChoiceOutcome::Completed { usage, .. } => usage.as_ref(),
            ChoiceOutcome::Failed { .. } => None,
        }
    }

    pub fn extra(&self) -> Option<&Value> {
        match &self.outcome {
            ChoiceOutcome::Completed { extra, .. } => extra.as_ref(),
            ChoiceOutcome::Failed { .. } => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, ChoiceOutcome::Failed { .. })
    }
}

/// Aggregated response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub choices: Vec<Choice>,
    pub usage: Usage,
}

/// Input of the top-level `create` call.
///
/// `model` and `prompt` accept either a single string or a list; the batch is the
/// cross product of both.
#[derive(Debug, Clone)]
pub struct CreateCompletion {
    pub model: OneOrMany,
    pub prompt: OneOrMany,
    pub params: GenerationParams,
    /// Per-namespace keys, taking precedence over configured and environment keys
    pub api_keys: Option<ApiKeys>,
    pub request_timeout: Option<Duration>,
}

impl CreateCompletion {
    pub fn new(model: impl Into<OneOrMany>, prompt: impl Into<OneOrMany>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            params: GenerationParams::default(),
            api_keys: None,
            request_timeout: None,
        }
    }

    pub fn params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.params.max_tokens = Some(max_tokens);
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.params.temperature = Some(temperature);
        self
    }

    pub fn top_p(mut self, top_p: f32) -> Self {
        self.params.top_p = Some(top_p);
        self
    }

    pub fn stop(mut self, stop: impl Into<OneOrMany>) -> Self {
        self.params.stop = Some(stop.into());
        self
    }

    pub fn api_key(mut self, namespace: impl Into<String>, key: impl Into<String>) -> Self {
        self.api_keys
            .get_or_insert_with(ApiKeys::new)
            .insert(namespace.into(), key.into());
        self
    }

    pub fn api_keys(mut self, keys: ApiKeys) -> Self {
        self.api_keys = Some(keys);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}

pub(crate) fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}
