//! Marketplace catalog client — the system of record for products.
//!
//! Search and detail lookups against the bearer-token catalog API.
//! Responses are mapped into tagged [`Listing`] values here, at the
//! ingestion boundary.

use crate::config::MarketplaceConfig;
use crate::model::{Listing, Source};
use crate::{ListingSource, ProviderError, Result};
use async_trait::async_trait;
use http::StatusCode;
use serde::Deserialize;
use std::time::Duration;

const PROVIDER: &str = "marketplace";

#[derive(Clone)]
pub struct MarketplaceClient {
    client: reqwest::Client,
    config: MarketplaceConfig,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogSearchResponse {
    #[serde(default)]
    products: Vec<CatalogProduct>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogProduct {
    url_key: String,
    title: String,
    style_id: Option<String>,
    product_category: Option<String>,
    image_url: Option<String>,
    lowest_ask: Option<f64>,
    #[serde(default)]
    sales_last_72_hours: u64,
}

impl CatalogProduct {
    fn into_listing(self, base_url: &url::Url) -> Listing {
        let url = base_url
            .join(&self.url_key)
            .map(|u| u.to_string())
            .ok();

        Listing {
            source: Source::Marketplace,
            id: self.url_key,
            title: self.title,
            style_code: self.style_id,
            price: self.lowest_ask,
            url,
            image: self.image_url,
            category: self.product_category,
            demand: self.sales_last_72_hours,
        }
    }
}

impl MarketplaceClient {
    pub fn new(config: MarketplaceConfig) -> Self {
        MarketplaceClient {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn api_key(&self) -> Result<String> {
        self.config
            .api_key()
            .ok_or(ProviderError::MissingCredential("marketplace api key"))
    }

    async fn catalog_search(&self, query: &str, limit: usize, sort: &str) -> Result<Vec<Listing>> {
        let api_key = self.api_key()?;
        let url = self
            .config
            .base_url
            .join("v2/catalog/search")
            .map_err(|e| ProviderError::unavailable(PROVIDER, e))?;

        let response = self
            .client
            .get(url)
            .bearer_auth(api_key)
            .query(&[
                ("query", query.to_string()),
                ("limit", limit.to_string()),
                ("sort", sort.to_string()),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::unavailable(PROVIDER, e))?;

        match response.status() {
            StatusCode::OK => {
                let parsed = response
                    .json::<CatalogSearchResponse>()
                    .await
                    .map_err(|e| ProviderError::parse(PROVIDER, e))?;
                Ok(parsed
                    .products
                    .into_iter()
                    .map(|p| p.into_listing(&self.config.base_url))
                    .collect())
            }
            status => Err(ProviderError::Unavailable {
                provider: PROVIDER,
                reason: format!("status {status}"),
            }),
        }
    }

    /// Detail lookup by catalog slug. The payload is relayed to the caller
    /// unchanged, so it stays an opaque JSON value here.
    pub async fn product(&self, slug: &str) -> Result<serde_json::Value> {
        let api_key = self.api_key()?;
        let url = self
            .config
            .base_url
            .join(&format!("v2/products/{slug}"))
            .map_err(|e| ProviderError::unavailable(PROVIDER, e))?;

        let response = self
            .client
            .get(url)
            .bearer_auth(api_key)
            .send()
            .await
            .map_err(|e| ProviderError::unavailable(PROVIDER, e))?;

        match response.status() {
            StatusCode::OK => response
                .json::<serde_json::Value>()
                .await
                .map_err(|e| ProviderError::parse(PROVIDER, e)),
            status => Err(ProviderError::Unavailable {
                provider: PROVIDER,
                reason: format!("status {status}"),
            }),
        }
    }
}

#[async_trait]
impl ListingSource for MarketplaceClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Listing>> {
        // An empty query is the trending view: popularity-sorted browse
        let sort = if query.trim().is_empty() {
            "most-active"
        } else {
            "relevance"
        };
        self.catalog_search(query, limit, sort).await
    }
}
