use serde::Deserialize;
use url::Url;

fn default_marketplace_timeout() -> u64 {
    8
}

fn default_classifieds_timeout() -> u64 {
    10
}

fn default_completion_timeout() -> u64 {
    25
}

fn default_image_cache_ttl() -> u64 {
    4 * 60 * 60
}

fn default_image_model() -> String {
    "grok-3-mini-fast".to_string()
}

fn default_classifieds_category() -> String {
    // Athletic shoes category on the classifieds marketplace
    "15709".to_string()
}

/// Resolves a credential from config, falling back to an environment
/// variable so deployments can keep secrets out of the config file.
fn resolve(configured: &Option<String>, env_var: &str) -> Option<String> {
    configured
        .clone()
        .or_else(|| std::env::var(env_var).ok())
        .filter(|s| !s.is_empty())
}

/// Marketplace provider (system of record for catalog completeness)
#[derive(Clone, Debug, Deserialize)]
pub struct MarketplaceConfig {
    pub base_url: Url,
    pub api_key: Option<String>,
    #[serde(default = "default_marketplace_timeout")]
    pub timeout_secs: u64,
}

impl MarketplaceConfig {
    pub fn api_key(&self) -> Option<String> {
        resolve(&self.api_key, "MARKETPLACE_API_KEY")
    }
}

/// Classified-listings provider (OAuth2 client credentials)
#[derive(Clone, Debug, Deserialize)]
pub struct ClassifiedsConfig {
    pub base_url: Url,
    pub auth_url: Url,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    #[serde(default = "default_classifieds_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_classifieds_category")]
    pub category_id: String,
    /// Listings above this price are not sneakers being sold, they are
    /// collectors flexing. Skip them at the source.
    pub max_price: Option<u64>,
}

impl ClassifiedsConfig {
    pub fn client_id(&self) -> Option<String> {
        resolve(&self.client_id, "CLASSIFIEDS_CLIENT_ID")
    }

    pub fn client_secret(&self) -> Option<String> {
        resolve(&self.client_secret, "CLASSIFIEDS_CLIENT_SECRET")
    }
}

/// Generative completion API (passthrough proxy + extraction helper)
#[derive(Clone, Debug, Deserialize)]
pub struct CompletionConfig {
    pub base_url: Url,
    pub api_key: Option<String>,
    #[serde(default = "default_completion_timeout")]
    pub timeout_secs: u64,
}

impl CompletionConfig {
    pub fn api_key(&self) -> Option<String> {
        resolve(&self.api_key, "COMPLETION_API_KEY")
    }
}

/// Chat-completions API used for best-effort image lookup
#[derive(Clone, Debug, Deserialize)]
pub struct ImagesConfig {
    pub base_url: Url,
    pub api_key: Option<String>,
    #[serde(default = "default_image_model")]
    pub model: String,
    #[serde(default = "default_completion_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_image_cache_ttl")]
    pub cache_ttl_secs: u64,
}

impl ImagesConfig {
    pub fn api_key(&self) -> Option<String> {
        resolve(&self.api_key, "IMAGE_API_KEY")
    }
}

/// Source-hosting content API holding the persisted release calendar
#[derive(Clone, Debug, Deserialize)]
pub struct ReleasesConfig {
    /// Full content-API URL of the calendar file
    pub file_url: Url,
    pub token: Option<String>,
}

impl ReleasesConfig {
    pub fn token(&self) -> Option<String> {
        resolve(&self.token, "CONTENT_STORE_TOKEN")
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ProvidersConfig {
    pub marketplace: MarketplaceConfig,
    pub classifieds: ClassifiedsConfig,
    pub completion: CompletionConfig,
    pub images: ImagesConfig,
    pub releases: ReleasesConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_deserialize_and_defaults_apply() {
        let config: MarketplaceConfig = serde_json::from_value(serde_json::json!({
            "base_url": "https://api.marketplace.example/"
        }))
        .expect("parse marketplace config");

        assert_eq!(config.base_url.as_str(), "https://api.marketplace.example/");
        assert_eq!(config.timeout_secs, 8);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn malformed_url_is_rejected() {
        let result: Result<ReleasesConfig, _> =
            serde_json::from_value(serde_json::json!({"file_url": "not a url"}));
        assert!(result.is_err());
    }
}
