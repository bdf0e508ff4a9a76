pub mod cache;
pub mod classifieds;
pub mod completion;
pub mod config;
pub mod images;
pub mod marketplace;
pub mod metrics_defs;
pub mod model;
pub mod releases;
#[cfg(test)]
pub(crate) mod testutils;

use async_trait::async_trait;
use model::Listing;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for provider operations
pub type Result<T, E = ProviderError> = std::result::Result<T, E>;

/// Errors that can occur while talking to upstream providers
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("missing credential: {0}")]
    MissingCredential(&'static str),

    #[error("{provider} request failed: {reason}")]
    Unavailable {
        provider: &'static str,
        reason: String,
    },

    #[error("{provider} request timed out")]
    Timeout { provider: &'static str },

    #[error("failed to parse {provider} payload: {reason}")]
    Parse {
        provider: &'static str,
        reason: String,
    },
}

impl ProviderError {
    pub fn unavailable(provider: &'static str, err: impl std::fmt::Display) -> Self {
        ProviderError::Unavailable {
            provider,
            reason: err.to_string(),
        }
    }

    pub fn parse(provider: &'static str, err: impl std::fmt::Display) -> Self {
        ProviderError::Parse {
            provider,
            reason: err.to_string(),
        }
    }
}

/// A provider that contributes raw listings to an aggregation pass.
///
/// Each implementation normalizes its own response shape into tagged
/// [`Listing`] values at the ingestion boundary, so the merge pipeline
/// never branches on provider-specific field names.
#[async_trait]
pub trait ListingSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Per-call deadline for this provider. Slow providers get a larger
    /// budget; the fan-out stage never waits past it.
    fn timeout(&self) -> Duration;

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Listing>>;
}
