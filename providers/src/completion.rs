//! Passthrough client for the generative completion API.
//!
//! This is the one transparently-forwarding path in the service: the
//! caller's body goes upstream unchanged and the upstream status and body
//! come back verbatim, because the caller needs the original diagnostic
//! detail. The search-augmentation beta header is added only when the
//! request actually asks for the web-search tool.

use crate::config::CompletionConfig;
use crate::{ProviderError, Result};
use serde_json::Value;
use std::time::Duration;

const PROVIDER: &str = "completion";
const API_VERSION: &str = "2023-06-01";
const WEB_SEARCH_BETA: &str = "web-search-2025-03-05";

#[derive(Clone)]
pub struct CompletionClient {
    client: reqwest::Client,
    config: CompletionConfig,
}

/// Upstream status and body, relayed to the caller as-is.
pub struct RelayedResponse {
    pub status: u16,
    pub body: Value,
}

fn uses_web_search(body: &Value) -> bool {
    body.get("tools")
        .and_then(Value::as_array)
        .is_some_and(|tools| {
            tools.iter().any(|t| {
                t.get("type")
                    .and_then(Value::as_str)
                    .is_some_and(|ty| ty.contains("web_search"))
            })
        })
}

impl CompletionClient {
    pub fn new(config: CompletionConfig) -> Self {
        CompletionClient {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn api_key(&self) -> Result<String> {
        self.config
            .api_key()
            .ok_or(ProviderError::MissingCredential("completion api key"))
    }

    async fn send(&self, body: &Value) -> Result<RelayedResponse> {
        let api_key = self.api_key()?;
        let url = self
            .config
            .base_url
            .join("v1/messages")
            .map_err(|e| ProviderError::unavailable(PROVIDER, e))?;

        let mut request = self
            .client
            .post(url)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .json(body);

        if uses_web_search(body) {
            request = request.header("anthropic-beta", WEB_SEARCH_BETA);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::unavailable(PROVIDER, e))?;

        let status = response.status().as_u16();
        let body = response
            .json::<Value>()
            .await
            .map_err(|e| ProviderError::parse(PROVIDER, e))?;

        if status >= 400 {
            tracing::error!(status, "completion upstream error");
        }

        Ok(RelayedResponse { status, body })
    }

    /// Forwards the caller's request body unchanged and relays the
    /// upstream response, whatever its status.
    pub async fn proxy(&self, body: &Value) -> Result<RelayedResponse> {
        self.send(body).await
    }

    /// Internal extraction helper: sends a single-prompt request and
    /// concatenates the text blocks of the reply. Used for HTML-to-data
    /// extraction of release-calendar content.
    pub async fn extract(&self, prompt: &str, web_search: bool) -> Result<String> {
        let mut body = serde_json::json!({
            "model": "claude-sonnet-4-20250514",
            "max_tokens": 4000,
            "messages": [{"role": "user", "content": prompt}],
        });
        if web_search {
            body["tools"] = serde_json::json!([
                {"type": "web_search_20250305", "name": "web_search", "max_uses": 5}
            ]);
        }

        let relayed = self.send(&body).await?;
        if relayed.status != 200 {
            return Err(ProviderError::Unavailable {
                provider: PROVIDER,
                reason: format!("status {}", relayed.status),
            });
        }

        let text = relayed
            .body
            .get("content")
            .and_then(Value::as_array)
            .map(|blocks| {
                blocks
                    .iter()
                    .filter(|b| b.get("type").and_then(Value::as_str) == Some("text"))
                    .filter_map(|b| b.get("text").and_then(Value::as_str))
                    .collect::<String>()
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(ProviderError::Parse {
                provider: PROVIDER,
                reason: "no text blocks in completion response".to_string(),
            });
        }

        Ok(text)
    }
}
