pub mod aggregate;
pub mod api;
pub mod config;
pub mod errors;
pub mod fanout;
pub mod filter;
pub mod matcher;
pub mod metrics_defs;
pub mod model;
pub mod normalize;

use api::{AppState, HandlerBody, dispatch, error_response};
use errors::CatalogError;
use http_body_util::{BodyExt, Empty};
use hyper::body::{Bytes, Incoming};
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode};
use shared::http::{apply_cors, run_http_service};
use std::pin::Pin;
use std::sync::Arc;

/// Starts the main action endpoint and the admin listener; returns only
/// on listener failure.
pub async fn run(config: config::Config) -> Result<(), CatalogError> {
    let state = Arc::new(AppState::new(&config));

    let api_service = CatalogService {
        state: state.clone(),
    };
    let admin_service = shared::admin_service::AdminService::<_, CatalogError>::new(|| true);

    let api_task = run_http_service(&config.listener.host, config.listener.port, api_service);
    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        admin_service,
    );

    tokio::try_join!(api_task, admin_task)?;
    Ok(())
}

pub struct CatalogService {
    state: Arc<AppState>,
}

impl CatalogService {
    pub fn new(state: Arc<AppState>) -> Self {
        CatalogService { state }
    }
}

impl Service<Request<Incoming>> for CatalogService {
    type Response = Response<HandlerBody>;
    type Error = CatalogError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let state = self.state.clone();

        Box::pin(async move {
            let response = handle(state, req).await;
            Ok(response.unwrap_or_else(|e| {
                tracing::warn!(error = %e, "request failed");
                error_response(&e)
            }))
        })
    }
}

async fn handle(
    state: Arc<AppState>,
    req: Request<Incoming>,
) -> Result<Response<HandlerBody>, CatalogError> {
    match *req.method() {
        Method::POST => {}
        // Browser preflight for the CORS-open endpoint
        Method::OPTIONS => {
            let mut response = Response::builder()
                .status(StatusCode::NO_CONTENT)
                .body(Empty::<Bytes>::new().map_err(|e| match e {}).boxed())
                .map_err(|e| CatalogError::ResponseBuild(e.to_string()))?;
            apply_cors(response.headers_mut());
            return Ok(response);
        }
        _ => return Err(CatalogError::MethodNotAllowed),
    }

    let bytes = req
        .into_body()
        .collect()
        .await
        .map_err(|e| CatalogError::BodyRead(e.to_string()))?
        .to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&bytes)
        .map_err(|e| CatalogError::InvalidBody(e.to_string()))?;

    dispatch(&state, body).await
}
