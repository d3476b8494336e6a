// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Building the completion service from a client manifest on disk.

use std::io::Write;

use mockito::Matcher;
use omnilm_core::application::CompletionService;
use omnilm_core::domain::client_config::ClientConfigManifest;
use omnilm_core::domain::completion::CreateCompletion;
use serde_json::json;
use tempfile::NamedTempFile;

fn manifest_file(endpoint: &str) -> NamedTempFile {
    let yaml = format!(
        r#"apiVersion: omnilm/v1
kind: ClientConfig
metadata:
  name: local-test
spec:
  defaults:
    enabled: false
    required: []
  providers:
    - namespace: local-vllm
      type: openai-compatible
      endpoint: {endpoint}
      api_key: sk-local
      models:
        - mistral-7b
        - mistralai/mixtral-8x7b
  dispatch:
    request_timeout_ms: 5000
"#
    );
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn test_configured_provider_serves_requests() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/completions")
        .match_header("authorization", "Bearer sk-local")
        .match_body(Matcher::PartialJson(json!({"model": "mistralai/mixtral-8x7b"})))
        .with_status(200)
        .with_body(json!({"choices": [{"text": "bonjour"}]}).to_string())
        .create_async()
        .await;

    let file = manifest_file(&format!("{}/v1/completions", server.url()));
    let manifest = ClientConfigManifest::from_yaml_file(file.path()).unwrap();
    let service = CompletionService::from_manifest(&manifest).unwrap();

    let response = service
        .create(CreateCompletion::new("mixtral-8x7b", "salut"))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(response.choices[0].model_name, "local-vllm/mistralai/mixtral-8x7b");
    assert_eq!(response.choices[0].text(), Some("bonjour"));
    assert!(service.registry().has_alias("mistral-7b"));
    assert!(!service.registry().has_alias("ada"));
}

#[test]
fn test_invalid_manifest_is_rejected() {
    let mut manifest = ClientConfigManifest::default();
    manifest.kind = "AgentConfig".to_string();

    let err = CompletionService::from_manifest(&manifest).err().unwrap();
    assert!(format!("{err:#}").contains("Invalid kind"));
}
