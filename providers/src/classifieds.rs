//! Classified-listings client.
//!
//! OAuth2 client-credentials authentication with the token held in the
//! TTL cache, and keyword search filtered to new-condition sneakers in a
//! price band. Listings here carry free-text titles and no structured
//! style codes; the fuzzy matching phase is what pairs them with catalog
//! products.

use crate::cache::TtlCache;
use crate::config::ClassifiedsConfig;
use crate::metrics_defs::TOKEN_REFRESH;
use crate::model::{Listing, Source};
use crate::{ListingSource, ProviderError, Result};
use async_trait::async_trait;
use http::StatusCode;
use serde::Deserialize;
use shared::counter;
use std::sync::Arc;
use std::time::Duration;

const PROVIDER: &str = "classifieds";
const TOKEN_CACHE_KEY: &str = "classifieds_access_token";

/// Subtracted from the provider-declared token lifetime so we never send
/// a credential the far end already considers stale.
const TOKEN_SAFETY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct ClassifiedsClient {
    client: reqwest::Client,
    config: ClassifiedsConfig,
    token_cache: Arc<TtlCache<String>>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemSearchResponse {
    #[serde(default)]
    item_summaries: Vec<ItemSummary>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemSummary {
    item_id: String,
    title: String,
    price: Option<ItemPrice>,
    item_web_url: Option<String>,
    image: Option<ItemImage>,
}

#[derive(Deserialize)]
struct ItemPrice {
    value: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemImage {
    image_url: String,
}

impl ItemSummary {
    fn into_listing(self) -> Listing {
        Listing {
            source: Source::Classifieds,
            id: self.item_id,
            title: self.title,
            style_code: None,
            price: self.price.and_then(|p| p.value.parse().ok()),
            url: self.item_web_url,
            image: self.image.map(|i| i.image_url),
            category: None,
            demand: 0,
        }
    }
}

impl ClassifiedsClient {
    pub fn new(config: ClassifiedsConfig, token_cache: Arc<TtlCache<String>>) -> Self {
        ClassifiedsClient {
            client: reqwest::Client::new(),
            config,
            token_cache,
        }
    }

    /// Returns a live access token, refreshing through the client
    /// credentials grant when the cached one has expired. Concurrent
    /// refreshes may race; both derive the same upstream truth and the
    /// later write wins.
    async fn access_token(&self) -> Result<String> {
        if let Some(token) = self.token_cache.get(TOKEN_CACHE_KEY) {
            return Ok(token);
        }

        let client_id = self
            .config
            .client_id()
            .ok_or(ProviderError::MissingCredential("classifieds client id"))?;
        let client_secret = self
            .config
            .client_secret()
            .ok_or(ProviderError::MissingCredential("classifieds client secret"))?;

        let response = self
            .client
            .post(self.config.auth_url.clone())
            .basic_auth(client_id, Some(client_secret))
            .form(&[
                ("grant_type", "client_credentials"),
                ("scope", "https://api.classifieds.example/oauth/api_scope"),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::unavailable(PROVIDER, e))?;

        if response.status() != StatusCode::OK {
            return Err(ProviderError::Unavailable {
                provider: PROVIDER,
                reason: format!("token endpoint status {}", response.status()),
            });
        }

        let token = response
            .json::<TokenResponse>()
            .await
            .map_err(|e| ProviderError::parse(PROVIDER, e))?;

        let lifetime = Duration::from_secs(token.expires_in)
            .saturating_sub(TOKEN_SAFETY_MARGIN)
            .max(Duration::from_secs(1));
        self.token_cache
            .insert(TOKEN_CACHE_KEY, token.access_token.clone(), lifetime);
        counter!(TOKEN_REFRESH).increment(1);
        tracing::debug!(expires_in = token.expires_in, "refreshed classifieds token");

        Ok(token.access_token)
    }

    fn search_filter(&self) -> String {
        match self.config.max_price {
            Some(ceiling) => format!("conditions:{{NEW}},price:[..{ceiling}]"),
            None => "conditions:{NEW}".to_string(),
        }
    }
}

#[async_trait]
impl ListingSource for ClassifiedsClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Listing>> {
        // Keyword search needs a keyword; the trending view has none and
        // gets no classifieds contribution
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        let token = self.access_token().await?;
        let url = self
            .config
            .base_url
            .join("buy/browse/v1/item_summary/search")
            .map_err(|e| ProviderError::unavailable(PROVIDER, e))?;

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .query(&[
                ("q", query.to_string()),
                ("category_ids", self.config.category_id.clone()),
                ("filter", self.search_filter()),
                ("limit", limit.to_string()),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::unavailable(PROVIDER, e))?;

        match response.status() {
            StatusCode::OK => {
                let parsed = response
                    .json::<ItemSearchResponse>()
                    .await
                    .map_err(|e| ProviderError::parse(PROVIDER, e))?;
                Ok(parsed
                    .item_summaries
                    .into_iter()
                    .map(ItemSummary::into_listing)
                    .collect())
            }
            status => Err(ProviderError::Unavailable {
                provider: PROVIDER,
                reason: format!("status {status}"),
            }),
        }
    }
}
