//! Release-calendar persistence and refresh.
//!
//! The calendar lives as a JSON file behind a source-hosting content API.
//! Reads fetch the base64 blob plus its version (sha); writes are
//! conditioned on that version so concurrent updates fail loudly instead
//! of clobbering each other. Refreshes ask the completion client (with the
//! web-search tool) for a fresh calendar and extract the JSON from the
//! model text.

use crate::completion::CompletionClient;
use crate::config::ReleasesConfig;
use crate::images::extract_json_array;
use crate::{ProviderError, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use http::StatusCode;
use serde::Deserialize;
use serde_json::Value;

const PROVIDER: &str = "content_store";

#[derive(Clone)]
pub struct ContentStore {
    client: reqwest::Client,
    config: ReleasesConfig,
}

#[derive(Deserialize)]
struct FileResponse {
    content: String,
    sha: String,
}

/// Decoded file content together with the blob version it was read at.
#[derive(Debug)]
pub struct StoredFile {
    pub content: String,
    pub sha: String,
}

impl ContentStore {
    pub fn new(config: ReleasesConfig) -> Self {
        ContentStore {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn token(&self) -> Result<String> {
        self.config
            .token()
            .ok_or(ProviderError::MissingCredential("content store token"))
    }

    pub async fn get(&self) -> Result<StoredFile> {
        let token = self.token()?;
        let response = self
            .client
            .get(self.config.file_url.clone())
            .bearer_auth(token)
            .header("accept", "application/vnd.github+json")
            .header("user-agent", "radar")
            .send()
            .await
            .map_err(|e| ProviderError::unavailable(PROVIDER, e))?;

        if response.status() != StatusCode::OK {
            return Err(ProviderError::Unavailable {
                provider: PROVIDER,
                reason: format!("status {}", response.status()),
            });
        }

        let file = response
            .json::<FileResponse>()
            .await
            .map_err(|e| ProviderError::parse(PROVIDER, e))?;

        // The API wraps base64 content across lines
        let cleaned: String = file.content.chars().filter(|c| !c.is_whitespace()).collect();
        let decoded = BASE64
            .decode(cleaned)
            .map_err(|e| ProviderError::parse(PROVIDER, e))?;
        let content =
            String::from_utf8(decoded).map_err(|e| ProviderError::parse(PROVIDER, e))?;

        Ok(StoredFile {
            content,
            sha: file.sha,
        })
    }

    /// Writes new content conditioned on the blob version read earlier.
    pub async fn put(&self, content: &str, sha: &str, message: &str) -> Result<()> {
        let token = self.token()?;
        let response = self
            .client
            .put(self.config.file_url.clone())
            .bearer_auth(token)
            .header("accept", "application/vnd.github+json")
            .header("user-agent", "radar")
            .json(&serde_json::json!({
                "message": message,
                "content": BASE64.encode(content),
                "sha": sha,
            }))
            .send()
            .await
            .map_err(|e| ProviderError::unavailable(PROVIDER, e))?;

        if !response.status().is_success() {
            return Err(ProviderError::Unavailable {
                provider: PROVIDER,
                reason: format!("write status {}", response.status()),
            });
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct ReleaseService {
    store: ContentStore,
    completion: CompletionClient,
}

impl ReleaseService {
    pub fn new(store: ContentStore, completion: CompletionClient) -> Self {
        ReleaseService { store, completion }
    }

    /// Returns the persisted calendar document.
    pub async fn get_releases(&self) -> Result<Value> {
        let file = self.store.get().await?;
        serde_json::from_str(&file.content).map_err(|e| ProviderError::parse(PROVIDER, e))
    }

    /// Refreshes the calendar: extract a fresh drop list via the model,
    /// then read-modify-write the stored file. Extraction failures leave
    /// the stored document untouched.
    pub async fn update_releases(&self) -> Result<Value> {
        let prompt = "Search for upcoming sneaker release dates over the next 60 days. \
                      Return ONLY a JSON array of objects with fields \
                      \"name\", \"date\" (ISO 8601), \"retailPrice\" and \"description\". \
                      Return ONLY the JSON array, no explanation.";
        let text = self.completion.extract(prompt, true).await?;

        let releases = extract_json_array(&text).ok_or_else(|| ProviderError::Parse {
            provider: "completion",
            reason: "no JSON array in release extraction".to_string(),
        })?;

        let count = releases.as_array().map(Vec::len).unwrap_or(0);
        let document = serde_json::json!({
            "updated": true,
            "count": count,
            "releases": releases,
        });

        let current = self.store.get().await?;
        let serialized = serde_json::to_string_pretty(&document)
            .map_err(|e| ProviderError::parse(PROVIDER, e))?;
        self.store
            .put(&serialized, &current.sha, "Update release calendar")
            .await?;

        tracing::info!(count, "release calendar updated");
        Ok(document)
    }
}
