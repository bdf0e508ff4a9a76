use providers::config::ProvidersConfig;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Pagination limits must be non-zero")]
    InvalidPagination,
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

fn default_page_limit() -> usize {
    20
}

fn default_max_limit() -> usize {
    100
}

#[derive(Clone, Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_page_limit")]
    pub default_limit: usize,
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination {
            default_limit: default_page_limit(),
            max_limit: default_max_limit(),
        }
    }
}

/// Catalog service configuration
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    /// Main listener for the JSON action endpoint
    pub listener: Listener,
    /// Admin listener for health/readiness
    pub admin_listener: Listener,
    /// Upstream provider endpoints and credentials
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub pagination: Pagination,
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;

        if self.pagination.default_limit == 0
            || self.pagination.max_limit < self.pagination.default_limit
        {
            return Err(ValidationError::InvalidPagination);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listener(port: u16) -> Listener {
        Listener {
            host: "127.0.0.1".to_string(),
            port,
        }
    }

    fn providers_config() -> ProvidersConfig {
        serde_yaml::from_str(
            r#"
            marketplace:
                base_url: https://api.marketplace.example/
            classifieds:
                base_url: https://api.classifieds.example/
                auth_url: https://auth.classifieds.example/oauth2/token
            completion:
                base_url: https://api.anthropic.com/
            images:
                base_url: https://api.x.ai/
            releases:
                file_url: https://api.github.example/repos/acme/site/contents/releases.json
            "#,
        )
        .expect("parse providers config")
    }

    #[test]
    fn zero_port_is_rejected() {
        let config = Config {
            listener: listener(0),
            admin_listener: listener(8081),
            providers: providers_config(),
            pagination: Pagination::default(),
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidPort)
        ));
    }

    #[test]
    fn default_pagination_is_valid() {
        let config = Config {
            listener: listener(8080),
            admin_listener: listener(8081),
            providers: providers_config(),
            pagination: Pagination::default(),
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.pagination.default_limit, 20);
    }
}
