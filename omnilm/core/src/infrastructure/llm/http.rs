// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Shared HTTP plumbing for the provider adapters
//
// Every adapter POSTs a JSON body with optional Bearer authentication and maps
// non-success statuses onto the same LLMError variants.

use reqwest::{header, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::llm::LLMError;

/// Map a non-success HTTP status onto the domain error, keeping the provider's body
pub(crate) fn error_for_status(status: StatusCode, body: &str) -> LLMError {
    match status.as_u16() {
        401 | 403 => LLMError::Authentication(format!("HTTP {}: {}", status, body)),
        429 => LLMError::RateLimit(format!("HTTP {}: {}", status, body)),
        _ => LLMError::Provider(format!("HTTP {}: {}", status, body)),
    }
}

/// POST `body` as JSON and decode the successful response as `R`
pub(crate) async fn post_json<B, R>(
    client: &Client,
    url: &str,
    api_key: Option<&str>,
    body: &B,
) -> Result<R, LLMError>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    if let Ok(payload) = serde_json::to_string(body) {
        tracing::trace!(url, "request: {}", payload);
    }

    let mut request = client
        .post(url)
        .header(header::CONTENT_TYPE, "application/json")
        .json(body);
    if let Some(key) = api_key {
        request = request.bearer_auth(key);
    }

    let response = request.send().await?;
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        return Err(error_for_status(status, &text));
    }

    serde_json::from_str(&text)
        .map_err(|e| LLMError::InvalidResponse(format!("Failed to parse response: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_auth_and_rate_limit_statuses() {
        assert!(matches!(
            error_for_status(StatusCode::UNAUTHORIZED, "bad key"),
            LLMError::Authentication(msg) if msg.contains("bad key")
        ));
        assert!(matches!(
            error_for_status(StatusCode::FORBIDDEN, ""),
            LLMError::Authentication(_)
        ));
        assert!(matches!(
            error_for_status(StatusCode::TOO_MANY_REQUESTS, "slow down"),
            LLMError::RateLimit(_)
        ));
    }

    #[test]
    fn other_statuses_embed_code_and_body() {
        let err = error_for_status(StatusCode::SERVICE_UNAVAILABLE, "model loading");
        assert_eq!(
            err.to_string(),
            "Provider error: HTTP 503 Service Unavailable: model loading"
        );
    }
}
