// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP adapters against mock provider endpoints: payload shape, auth headers
//! and error mapping.

use std::sync::Arc;

use mockito::Matcher;
use omnilm_core::application::CompletionService;
use omnilm_core::domain::completion::{CompletionRequest, CreateCompletion, GenerationParams, Usage};
use omnilm_core::domain::llm::{CompletionProvider, LLMError};
use omnilm_core::infrastructure::llm::{
    CohereAdapter, DefaultProviders, HuggingFaceAdapter, OpenAIAdapter, ProviderRegistry,
};
use serde_json::json;

fn request(model: &str, prompt: &str, params: GenerationParams) -> CompletionRequest {
    CompletionRequest::new(model, prompt, params)
}

#[tokio::test]
async fn test_openai_sends_only_set_parameters() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/completions")
        .match_header("authorization", "Bearer sk-test")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({
            "model": "ada",
            "prompt": "Hello world",
            "max_tokens": 16,
            "stop": ["\n"]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "id": "cmpl-123",
                "object": "text_completion",
                "choices": [{"text": " and goodbye", "index": 0}],
                "usage": {"prompt_tokens": 2, "completion_tokens": 3, "total_tokens": 5}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let adapter = OpenAIAdapter::new(Some("sk-test".to_string()))
        .with_endpoint(format!("{}/v1/completions", server.url()));
    let params = GenerationParams {
        max_tokens: Some(16),
        stop: Some(vec!["\n"].into()),
        ..Default::default()
    };

    let completion = adapter
        .create_completion(&request("ada", "Hello world", params))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(completion.text, " and goodbye");
    assert_eq!(completion.usage, Some(Usage::new(2, 3, 5)));
    assert_eq!(completion.extra, Some(json!({"id": "cmpl-123"})));
}

#[tokio::test]
async fn test_openai_omits_authorization_without_key() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/completions")
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_body(json!({"choices": [{"text": "ok"}]}).to_string())
        .create_async()
        .await;

    let adapter = OpenAIAdapter::new(None).with_endpoint(format!("{}/v1/completions", server.url()));
    let completion = adapter
        .create_completion(&request("ada", "hi", GenerationParams::default()))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(completion.text, "ok");
    assert!(completion.usage.is_none());
}

#[tokio::test]
async fn test_openai_status_mapping() {
    let mut server = mockito::Server::new_async().await;
    let _unauthorized = server
        .mock("POST", "/unauthorized")
        .with_status(401)
        .with_body("invalid api key")
        .create_async()
        .await;
    let _limited = server
        .mock("POST", "/limited")
        .with_status(429)
        .with_body("slow down")
        .create_async()
        .await;
    let _broken = server
        .mock("POST", "/broken")
        .with_status(500)
        .with_body("overloaded")
        .create_async()
        .await;

    let call = |path: &str| {
        OpenAIAdapter::new(Some("sk".to_string())).with_endpoint(format!("{}{}", server.url(), path))
    };
    let req = request("ada", "hi", GenerationParams::default());

    assert!(matches!(
        call("/unauthorized").create_completion(&req).await,
        Err(LLMError::Authentication(msg)) if msg.contains("invalid api key")
    ));
    assert!(matches!(
        call("/limited").create_completion(&req).await,
        Err(LLMError::RateLimit(_))
    ));
    match call("/broken").create_completion(&req).await {
        Err(LLMError::Provider(msg)) => {
            assert!(msg.starts_with("HTTP 500"));
            assert!(msg.contains("overloaded"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_openai_error_body_is_provider_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/completions")
        .with_status(200)
        .with_body(json!({"error": {"message": "The model `foo` does not exist"}}).to_string())
        .create_async()
        .await;

    let adapter = OpenAIAdapter::new(None).with_endpoint(format!("{}/v1/completions", server.url()));
    let err = adapter
        .create_completion(&request("foo", "hi", GenerationParams::default()))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Provider error: The model `foo` does not exist");
}

#[tokio::test]
async fn test_openai_malformed_body_is_invalid_response() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/completions")
        .with_status(200)
        .with_body("not json")
        .create_async()
        .await;

    let adapter = OpenAIAdapter::new(None).with_endpoint(format!("{}/v1/completions", server.url()));
    assert!(matches!(
        adapter
            .create_completion(&request("ada", "hi", GenerationParams::default()))
            .await,
        Err(LLMError::InvalidResponse(_))
    ));
}

#[tokio::test]
async fn test_huggingface_posts_to_model_path() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/models/bigscience/bloom-560m")
        .match_header("authorization", "Bearer hf-token")
        .match_body(Matcher::Json(json!({
            "inputs": "Once upon a time",
            "parameters": {"temperature": 0.5, "max_new_tokens": 8}
        })))
        .with_status(200)
        .with_body(json!([{"generated_text": "there was a crab"}]).to_string())
        .create_async()
        .await;

    let adapter = HuggingFaceAdapter::new(Some("hf-token".to_string()))
        .with_endpoint(format!("{}/models", server.url()));
    let params = GenerationParams {
        temperature: Some(0.5),
        max_tokens: Some(8),
        ..Default::default()
    };

    let completion = adapter
        .create_completion(&request("bigscience/bloom-560m", "Once upon a time", params))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(completion.text, "there was a crab");
    assert!(completion.usage.is_none());
}

#[tokio::test]
async fn test_huggingface_omits_empty_parameters() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/models/gpt2")
        .match_body(Matcher::Json(json!({"inputs": "hi"})))
        .with_status(200)
        .with_body(json!([{"generated_text": "hi there"}]).to_string())
        .create_async()
        .await;

    let adapter = HuggingFaceAdapter::new(None).with_endpoint(format!("{}/models/", server.url()));
    adapter
        .create_completion(&request("gpt2", "hi", GenerationParams::default()))
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_cohere_maps_parameters_and_usage() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/generate")
        .match_header("authorization", "Bearer co-key")
        .match_body(Matcher::Json(json!({
            "prompt": "Write a haiku",
            "model": "command",
            "p": 0.9,
            "stop_sequences": ["END"]
        })))
        .with_status(200)
        .with_body(
            json!({
                "id": "req-1",
                "generations": [{"id": "gen-1", "text": "autumn moonlight"}],
                "meta": {"billed_units": {"input_tokens": 3, "output_tokens": 4}}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let adapter = CohereAdapter::new(Some("co-key".to_string()))
        .with_endpoint(format!("{}/v1/generate", server.url()));
    let params = GenerationParams {
        top_p: Some(0.9),
        stop: Some("END".into()),
        ..Default::default()
    };

    let completion = adapter
        .create_completion(&request("command", "Write a haiku", params))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(completion.text, "autumn moonlight");
    assert_eq!(completion.usage, Some(Usage::new(3, 4, 7)));
    assert_eq!(
        completion.extra,
        Some(json!({"request_id": "req-1", "generation_id": "gen-1"}))
    );
}

#[tokio::test]
async fn test_end_to_end_ada_through_service() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/completions")
        .match_header("authorization", "Bearer sk-call")
        .match_body(Matcher::PartialJson(json!({"model": "ada", "prompt": "Hello world"})))
        .with_status(200)
        .with_body(
            json!({
                "id": "cmpl-e2e",
                "choices": [{"text": ", this is a test."}],
                "usage": {"prompt_tokens": 2, "completion_tokens": 6, "total_tokens": 8}
            })
            .to_string(),
        )
        .create_async()
        .await;

    // Built-ins stay off so the mock-backed adapter is the only "ada".
    let registry = Arc::new(ProviderRegistry::new());
    registry.register(Arc::new(
        OpenAIAdapter::new(Some("sk-call".to_string()))
            .with_endpoint(format!("{}/v1/completions", server.url())),
    ));
    let service = CompletionService::with_defaults(
        registry,
        DefaultProviders::new().without_builtin().with_env(|_| None),
    );

    let response = service
        .create(CreateCompletion::new(vec!["ada"], "Hello world"))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(response.choices.len(), 1);
    let choice = &response.choices[0];
    assert_eq!(choice.model_name, "openai.com/ada");
    assert!(!choice.text().unwrap().is_empty());
    let usage = response.usage;
    assert_eq!(usage.total_tokens, usage.prompt_tokens + usage.completion_tokens);
    assert_eq!(choice.extra(), Some(&json!({"id": "cmpl-e2e"})));
}
