//! The single JSON action endpoint.
//!
//! Every request is a POST with a JSON body discriminated by an `action`
//! field; bodies without a recognized action are relayed to the completion
//! API unchanged. Validation failures are rejected before any upstream
//! call; a partial provider failure never fails the response.

use crate::aggregate::aggregate;
use crate::config::{Config, Pagination};
use crate::errors::{CatalogError, Result};
use crate::fanout::fan_out;
use crate::matcher::match_listings;
use crate::metrics_defs::SEARCH_REQUESTS;
use crate::model::SearchPage;
use http_body_util::{BodyExt, Full, combinators::BoxBody};
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use providers::ListingSource;
use providers::cache::TtlCache;
use providers::classifieds::ClassifiedsClient;
use providers::completion::CompletionClient;
use providers::images::ImageLookup;
use providers::marketplace::MarketplaceClient;
use providers::model::Source;
use providers::releases::{ContentStore, ReleaseService};
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use shared::counter;
use shared::http::apply_cors;
use std::sync::Arc;

pub type HandlerBody = BoxBody<Bytes, CatalogError>;

/// Everything one aggregation pass needs, built once at startup and
/// shared across requests. The only cross-request mutable state lives
/// inside the TTL caches.
pub struct AppState {
    marketplace: MarketplaceClient,
    sources: Vec<Arc<dyn ListingSource>>,
    completion: CompletionClient,
    images: ImageLookup,
    releases: ReleaseService,
    pagination: Pagination,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let marketplace = MarketplaceClient::new(config.providers.marketplace.clone());
        let classifieds = ClassifiedsClient::new(
            config.providers.classifieds.clone(),
            Arc::new(TtlCache::new()),
        );
        let completion = CompletionClient::new(config.providers.completion.clone());
        let images = ImageLookup::new(config.providers.images.clone(), Arc::new(TtlCache::new()));
        let releases = ReleaseService::new(
            ContentStore::new(config.providers.releases.clone()),
            completion.clone(),
        );

        let sources: Vec<Arc<dyn ListingSource>> =
            vec![Arc::new(marketplace.clone()), Arc::new(classifieds)];

        AppState {
            marketplace,
            sources,
            completion,
            images,
            releases,
            pagination: config.pagination.clone(),
        }
    }

    /// Swaps in custom listing sources; used by tests to exercise the
    /// pipeline without network providers.
    #[cfg(test)]
    pub fn with_sources(mut self, sources: Vec<Arc<dyn ListingSource>>) -> Self {
        self.sources = sources;
        self
    }
}

#[derive(Deserialize)]
struct SearchRequest {
    #[serde(default)]
    query: String,
    limit: Option<usize>,
    page: Option<usize>,
}

#[derive(Deserialize)]
struct ProductRequest {
    slug: Option<String>,
}

#[derive(Deserialize)]
struct ImageRequest {
    #[serde(default)]
    query: String,
}

#[derive(Deserialize)]
struct DropName {
    name: String,
}

#[derive(Deserialize)]
struct BatchImageRequest {
    #[serde(default)]
    drops: Vec<DropName>,
}

/// Runs the full aggregation pass: fan out, partition by source, match,
/// filter, rank, paginate.
async fn run_search(state: &AppState, request: SearchRequest) -> Result<SearchPage> {
    counter!(SEARCH_REQUESTS).increment(1);

    let limit = request
        .limit
        .unwrap_or(state.pagination.default_limit)
        .clamp(1, state.pagination.max_limit);
    let page = request.page.unwrap_or(1).max(1);

    // Fetch enough rows to cover the requested window plus matching slack
    let fetch_limit = limit
        .saturating_mul(page)
        .clamp(limit, state.pagination.max_limit);

    let slots = fan_out(&state.sources, &request.query, fetch_limit).await;
    if slots.iter().all(|slot| slot.outcome.is_err()) {
        return Err(CatalogError::AllProvidersFailed);
    }

    let mut primaries = Vec::new();
    let mut secondaries = Vec::new();
    for slot in slots {
        for listing in slot.outcome.unwrap_or_default() {
            match listing.source {
                Source::Marketplace => primaries.push(listing),
                Source::Classifieds => secondaries.push(listing),
            }
        }
    }

    let matched = match_listings(&primaries, &secondaries);
    Ok(aggregate(primaries, matched, page, limit))
}

fn parse_request<T: serde::de::DeserializeOwned>(body: &Value) -> Result<T> {
    serde_json::from_value(body.clone()).map_err(|e| CatalogError::InvalidBody(e.to_string()))
}

fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Result<Response<HandlerBody>> {
    let bytes = serde_json::to_vec(value).map_err(|e| CatalogError::ResponseBuild(e.to_string()))?;

    let mut response = Response::builder()
        .status(status)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(bytes)).map_err(|e| match e {}).boxed())
        .map_err(|e| CatalogError::ResponseBuild(e.to_string()))?;
    apply_cors(response.headers_mut());
    Ok(response)
}

/// Dispatches a parsed request body to its action handler.
pub async fn dispatch(state: &AppState, body: Value) -> Result<Response<HandlerBody>> {
    let action = body.get("action").and_then(Value::as_str).unwrap_or("");
    tracing::debug!(action, "dispatching request");

    match action {
        "search" | "trending" => {
            let mut request: SearchRequest = parse_request(&body)?;
            if action == "trending" {
                request.query = String::new();
            }
            let page = run_search(state, request).await?;
            json_response(StatusCode::OK, &page)
        }
        "product" => {
            let request: ProductRequest = parse_request(&body)?;
            let slug = request.slug.ok_or(CatalogError::MissingField("slug"))?;
            let detail = state.marketplace.product(&slug).await?;
            json_response(StatusCode::OK, &detail)
        }
        "sneaker_image" => {
            let request: ImageRequest = parse_request(&body)?;
            let result = state.images.single(&request.query);
            json_response(StatusCode::OK, &result)
        }
        "sneaker_images" => {
            let request: BatchImageRequest = parse_request(&body)?;
            let names: Vec<String> = request.drops.into_iter().map(|d| d.name).collect();
            let results = state.images.batch(&names).await?;
            json_response(
                StatusCode::OK,
                &serde_json::json!({"results": results}),
            )
        }
        "get_releases" => {
            let document = state.releases.get_releases().await?;
            json_response(StatusCode::OK, &document)
        }
        "update_releases" => {
            let document = state.releases.update_releases().await?;
            json_response(StatusCode::OK, &document)
        }
        _ => {
            // No recognized action: transparent completion passthrough,
            // relaying the upstream status and body verbatim
            let relayed = state.completion.proxy(&body).await?;
            let status = StatusCode::from_u16(relayed.status)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            json_response(status, &relayed.body)
        }
    }
}

/// Builds the error response for a failed request, in the same JSON shape
/// the original endpoint used.
pub fn error_response(error: &CatalogError) -> Response<HandlerBody> {
    let status = error.status_code();
    let payload = serde_json::json!({"error": error.to_string()});
    json_response(status, &payload).unwrap_or_else(|_| {
        let mut response = Response::new(Full::new(Bytes::new()).map_err(|e| match e {}).boxed());
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        response
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use providers::ProviderError;
    use providers::model::Listing;
    use std::time::Duration;

    struct FakeSource {
        name: &'static str,
        listings: Vec<Listing>,
        fail: bool,
    }

    #[async_trait]
    impl ListingSource for FakeSource {
        fn name(&self) -> &'static str {
            self.name
        }

        fn timeout(&self) -> Duration {
            Duration::from_secs(1)
        }

        async fn search(&self, _query: &str, _limit: usize) -> providers::Result<Vec<Listing>> {
            if self.fail {
                return Err(ProviderError::Unavailable {
                    provider: self.name,
                    reason: "down".to_string(),
                });
            }
            Ok(self.listings.clone())
        }
    }

    fn test_state(sources: Vec<Arc<dyn ListingSource>>) -> AppState {
        let config: Config = serde_yaml::from_str(
            r#"
            listener: {host: 127.0.0.1, port: 8080}
            admin_listener: {host: 127.0.0.1, port: 8081}
            providers:
                marketplace: {base_url: "https://market.example/"}
                classifieds:
                    base_url: "https://classifieds.example/"
                    auth_url: "https://auth.classifieds.example/oauth2/token"
                completion: {base_url: "https://completion.example/"}
                images: {base_url: "https://images.example/"}
                releases: {file_url: "https://content.example/releases.json"}
            "#,
        )
        .expect("parse test config");
        AppState::new(&config).with_sources(sources)
    }

    fn primary(id: &str, title: &str, style: Option<&str>, demand: u64) -> Listing {
        let mut l = Listing::new(Source::Marketplace, id, title);
        l.style_code = style.map(String::from);
        l.demand = demand;
        l
    }

    fn secondary(id: &str, title: &str, price: f64) -> Listing {
        let mut l = Listing::new(Source::Classifieds, id, title);
        l.price = Some(price);
        l
    }

    async fn body_json(response: Response<HandlerBody>) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn search_merges_matches_and_ranks() {
        let marketplace = FakeSource {
            name: "marketplace",
            listings: vec![
                primary("jordan-1-high-og", "Air Jordan 1 Retro High OG", None, 40),
                primary("dunk-low-panda", "Nike Dunk Low Panda", None, 90),
            ],
            fail: false,
        };
        let classifieds = FakeSource {
            name: "classifieds",
            listings: vec![secondary("c1", "Jordan 1 High OG New", 199.0)],
            fail: false,
        };
        let state = test_state(vec![Arc::new(marketplace), Arc::new(classifieds)]);

        let response = dispatch(
            &state,
            serde_json::json!({"action": "search", "query": "shoes"}),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let page = body_json(response).await;
        assert_eq!(page["total"], 2);
        // Demand ordering: panda (90) first
        assert_eq!(page["data"][0]["id"], "dunk-low-panda");
        assert_eq!(page["data"][0]["_secondary"], Value::Null);
        // Jordan got the classifieds enrichment
        assert_eq!(
            page["data"][1]["_secondary"]["classifieds"]["price"],
            199.0
        );
    }

    #[tokio::test]
    async fn partial_provider_failure_still_returns_data() {
        let marketplace = FakeSource {
            name: "marketplace",
            listings: vec![primary("p1", "Air Jordan 4 Bred", None, 10)],
            fail: false,
        };
        let classifieds = FakeSource {
            name: "classifieds",
            listings: vec![],
            fail: true,
        };
        let state = test_state(vec![Arc::new(marketplace), Arc::new(classifieds)]);

        let response = dispatch(
            &state,
            serde_json::json!({"action": "search", "query": "bred"}),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let page = body_json(response).await;
        assert_eq!(page["total"], 1);
        assert_eq!(page["data"][0]["_secondary"], Value::Null);
    }

    #[tokio::test]
    async fn total_fanout_failure_is_a_hard_error() {
        let state = test_state(vec![
            Arc::new(FakeSource {
                name: "marketplace",
                listings: vec![],
                fail: true,
            }),
            Arc::new(FakeSource {
                name: "classifieds",
                listings: vec![],
                fail: true,
            }),
        ]);

        let result = dispatch(&state, serde_json::json!({"action": "search"})).await;
        assert!(matches!(
            result.unwrap_err(),
            CatalogError::AllProvidersFailed
        ));
    }

    #[tokio::test]
    async fn product_without_slug_is_a_validation_error() {
        let state = test_state(vec![]);
        let result = dispatch(&state, serde_json::json!({"action": "product"})).await;
        assert!(matches!(
            result.unwrap_err(),
            CatalogError::MissingField("slug")
        ));
    }

    #[tokio::test]
    async fn search_pagination_flows_through() {
        let listings: Vec<Listing> = (0..7)
            .map(|i| primary(&format!("p{i}"), "Nike Dunk Low", None, 7 - i as u64))
            .collect();
        let state = test_state(vec![Arc::new(FakeSource {
            name: "marketplace",
            listings,
            fail: false,
        })]);

        let response = dispatch(
            &state,
            serde_json::json!({"action": "search", "query": "dunk", "limit": 3, "page": 3}),
        )
        .await
        .unwrap();
        let page = body_json(response).await;

        assert_eq!(page["total"], 7);
        assert_eq!(page["page"], 3);
        assert_eq!(page["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn absurd_page_numbers_return_an_empty_window() {
        let state = test_state(vec![Arc::new(FakeSource {
            name: "marketplace",
            listings: vec![primary("p1", "Nike Dunk Low", None, 1)],
            fail: false,
        })]);

        let response = dispatch(
            &state,
            serde_json::json!({
                "action": "search",
                "query": "dunk",
                "limit": 100,
                "page": usize::MAX,
            }),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let page = body_json(response).await;
        assert_eq!(page["total"], 1);
        assert_eq!(page["data"].as_array().unwrap().len(), 0);
    }
}
