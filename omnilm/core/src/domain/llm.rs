// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Llm
//!
//! Provider capability set shared by every completion backend.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Anti-corruption boundary between the completion engine and vendor APIs

// Completion Provider Domain Interface
//
// Every backend (OpenAI-style, Hugging Face, Cohere, user-supplied) implements the
// same three capabilities. The registry only ever sees this trait, so adapters are
// chosen at registration time rather than by inspecting concrete types.
//
// Implementations in infrastructure/llm/ directory.

use std::time::Duration;

use async_trait::async_trait;

use super::completion::{CompletionRequest, ProviderCompletion};

/// Domain interface for completion providers
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Perform a single completion call.
    ///
    /// `request.model` is the canonical model name (the FQN with this provider's
    /// namespace stripped), never an alias.
    async fn create_completion(
        &self,
        request: &CompletionRequest,
    ) -> Result<ProviderCompletion, LLMError>;

    /// Models served by this provider. Treated as fixed for the provider's lifetime.
    fn list_models(&self) -> Vec<String>;

    /// Namespace prefix used to build fully-qualified model names.
    fn namespace(&self) -> &str;
}

/// Errors that can occur while resolving or executing a single completion
#[derive(Debug, Clone, thiserror::Error)]
pub enum LLMError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Model {name} not found. Currently registered models:\n{known}")]
    ModelNotFound { name: String, known: String },

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Completion task failed: {0}")]
    TaskFailed(String),
}

impl LLMError {
    /// Text stored in a choice's `error` field.
    pub fn to_choice_error(&self) -> String {
        format!("Error: {self}")
    }
}

impl From<reqwest::Error> for LLMError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            LLMError::InvalidResponse(err.to_string())
        } else {
            LLMError::Network(err.to_string())
        }
    }
}
