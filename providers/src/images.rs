//! Best-effort product-image lookup.
//!
//! Image URLs are extracted from a chat-completions model asked to produce
//! a JSON array of product page and image links. Inherently approximate:
//! unparsable model output degrades to an empty result, never an error.
//! Results are cached for hours because the underlying call is expensive
//! and the answers are stable.

use crate::cache::TtlCache;
use crate::config::ImagesConfig;
use crate::{ProviderError, Result};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const PROVIDER: &str = "images";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageResult {
    pub thumbnail: Option<String>,
    pub product_url: Option<String>,
}

impl ImageResult {
    pub fn empty() -> Self {
        ImageResult {
            thumbnail: None,
            product_url: None,
        }
    }
}

#[derive(Clone)]
pub struct ImageLookup {
    client: reqwest::Client,
    config: ImagesConfig,
    cache: Arc<TtlCache<ImageResult>>,
}

/// Cache keys are slugified names so lookups survive punctuation and
/// casing differences between the calendar and the caller.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Pulls the first JSON array out of free-form model text, tolerating
/// markdown code fences around it.
pub(crate) fn extract_json_array(text: &str) -> Option<Value> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end < start {
        return None;
    }
    let candidate = text[start..=end].replace("```json", "").replace("```", "");
    serde_json::from_str(candidate.trim()).ok()
}

impl ImageLookup {
    pub fn new(config: ImagesConfig, cache: Arc<TtlCache<ImageResult>>) -> Self {
        ImageLookup {
            client: reqwest::Client::new(),
            config,
            cache,
        }
    }

    /// Cache-only single lookup (the legacy `sneaker_image` action).
    /// Misses return an empty result rather than triggering a model call.
    pub fn single(&self, query: &str) -> ImageResult {
        self.cache
            .get(&slugify(query))
            .unwrap_or_else(ImageResult::empty)
    }

    /// Batch lookup for a list of product names. Names with live cache
    /// entries are served from cache; a model call is made only when at
    /// least one name is missing. Returns a result per requested name,
    /// empty where nothing could be found.
    pub async fn batch(&self, names: &[String]) -> Result<HashMap<String, ImageResult>> {
        let mut results = HashMap::new();
        let mut missing = Vec::new();
        for name in names {
            match self.cache.get(&slugify(name)) {
                Some(cached) => {
                    results.insert(name.clone(), cached);
                }
                None => missing.push(name.clone()),
            }
        }

        if missing.is_empty() {
            return Ok(results);
        }

        match self.fetch_from_model(&missing).await {
            Ok(fetched) => {
                let ttl = Duration::from_secs(self.config.cache_ttl_secs);
                for (name, result) in fetched {
                    self.cache.insert(&slugify(&name), result.clone(), ttl);
                    results.insert(name, result);
                }
            }
            Err(e) => {
                // Best effort only: a broken lookup never fails the caller
                tracing::warn!(error = %e, "image lookup failed");
            }
        }

        for name in missing {
            results.entry(name).or_insert_with(ImageResult::empty);
        }
        Ok(results)
    }

    async fn fetch_from_model(&self, names: &[String]) -> Result<Vec<(String, ImageResult)>> {
        let api_key = self
            .config
            .api_key()
            .ok_or(ProviderError::MissingCredential("image api key"))?;
        let url = self
            .config
            .base_url
            .join("v1/chat/completions")
            .map_err(|e| ProviderError::unavailable(PROVIDER, e))?;

        let name_list = names.join("\n- ");
        let prompt = format!(
            "For each sneaker below, provide the marketplace product page URL and product image URL.\n\n\
             Sneakers:\n- {name_list}\n\n\
             Return ONLY a JSON array: \
             [{{\"name\":\"exact shoe name\",\"productUrl\":\"https://...\",\"imageUrl\":\"https://...\"}}]\n\
             Return ONLY the JSON array, no explanation."
        );

        let response = self
            .client
            .post(url)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .bearer_auth(api_key)
            .json(&serde_json::json!({
                "model": self.config.model,
                "messages": [{"role": "user", "content": prompt}],
                "max_tokens": 2000,
                "temperature": 0,
            }))
            .send()
            .await
            .map_err(|e| ProviderError::unavailable(PROVIDER, e))?;

        if response.status() != StatusCode::OK {
            return Err(ProviderError::Unavailable {
                provider: PROVIDER,
                reason: format!("status {}", response.status()),
            });
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| ProviderError::parse(PROVIDER, e))?;
        let text = body["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default();

        let items = extract_json_array(text).ok_or_else(|| ProviderError::Parse {
            provider: PROVIDER,
            reason: "no JSON array in model output".to_string(),
        })?;

        let mut fetched = Vec::new();
        if let Some(items) = items.as_array() {
            for item in items {
                let Some(name) = item.get("name").and_then(Value::as_str) else {
                    continue;
                };
                fetched.push((
                    name.to_string(),
                    ImageResult {
                        thumbnail: item
                            .get("imageUrl")
                            .and_then(Value::as_str)
                            .map(String::from),
                        product_url: item
                            .get("productUrl")
                            .and_then(Value::as_str)
                            .map(String::from),
                    },
                ));
            }
        }
        tracing::debug!(count = fetched.len(), "cached image lookup results");
        Ok(fetched)
    }
}
