use hyper::StatusCode;
use providers::ProviderError;
use thiserror::Error;

/// Result type alias for catalog operations
pub type Result<T, E = CatalogError> = std::result::Result<T, E>;

/// Errors that can occur while serving an aggregation request
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("failed to read request body: {0}")]
    BodyRead(String),

    #[error("no provider could be reached")]
    AllProvidersFailed,

    #[error("failed to build response: {0}")]
    ResponseBuild(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CatalogError {
    /// Maps the error taxonomy onto response status codes. Validation
    /// failures reject before any upstream call; missing credentials and
    /// total fan-out failure are the only hard 500s.
    pub fn status_code(&self) -> StatusCode {
        match self {
            CatalogError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            CatalogError::InvalidBody(_)
            | CatalogError::MissingField(_)
            | CatalogError::BodyRead(_) => StatusCode::BAD_REQUEST,
            CatalogError::AllProvidersFailed
            | CatalogError::ResponseBuild(_)
            | CatalogError::Provider(_)
            | CatalogError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
