//! Client and executor configuration.
//!
//! # Design
//! Configuration is plain data handed to constructors; nothing is global.
//! The endpoint is fixed per client and validated once, up front.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::ApiError;

pub const DEFAULT_ENDPOINT: &str = "https://api.pinboard.in/v1";

pub const TOKEN_VAR: &str = "PINBOARD_TOKEN";
pub const ENDPOINT_VAR: &str = "PINBOARD_ENDPOINT";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where to send requests and which account to authenticate as.
#[derive(Clone, Deserialize)]
pub struct ClientConfig {
    /// Base URL including the version prefix, e.g. `https://api.pinboard.in/v1`.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// API token of the form `user:HEX`.
    pub token: String,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

impl ClientConfig {
    pub fn new(token: &str) -> Self {
        Self {
            endpoint: default_endpoint(),
            token: token.to_string(),
        }
    }

    /// Read `PINBOARD_TOKEN` and, optionally, `PINBOARD_ENDPOINT`.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let token = lookup(TOKEN_VAR)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::InvalidConfig(format!("{TOKEN_VAR} is not set")))?;
        let endpoint = lookup(ENDPOINT_VAR)
            .filter(|e| !e.is_empty())
            .unwrap_or_else(default_endpoint);
        let config = Self { endpoint, token };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if self.token.is_empty() {
            return Err(ApiError::InvalidConfig("token is empty".to_string()));
        }
        let url = Url::parse(&self.endpoint)
            .map_err(|e| ApiError::InvalidConfig(format!("endpoint {:?}: {e}", self.endpoint)))?;
        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(ApiError::InvalidConfig(format!(
                    "endpoint scheme must be http or https, got {other}"
                )))
            }
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(ApiError::InvalidConfig(
                "endpoint must not carry a query or fragment".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("token", &"***")
            .finish()
    }
}

/// Settings for the shipped blocking executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Upper bound on a whole exchange, connect through body.
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: concat!("pinboard-core/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn env_token_is_required() {
        let err = ClientConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ApiError::InvalidConfig(msg) if msg.contains(TOKEN_VAR)));
    }

    #[test]
    fn env_endpoint_defaults_to_public_api() {
        let config = ClientConfig::from_lookup(lookup(&[(TOKEN_VAR, "user:ABC")])).unwrap();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.token, "user:ABC");
    }

    #[test]
    fn env_endpoint_override_is_validated() {
        let config = ClientConfig::from_lookup(lookup(&[
            (TOKEN_VAR, "user:ABC"),
            (ENDPOINT_VAR, "http://127.0.0.1:3000/v1"),
        ]))
        .unwrap();
        assert_eq!(config.endpoint, "http://127.0.0.1:3000/v1");

        let err = ClientConfig::from_lookup(lookup(&[
            (TOKEN_VAR, "user:ABC"),
            (ENDPOINT_VAR, "ftp://example.com/v1"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidConfig(_)));
    }

    #[test]
    fn endpoint_with_query_is_rejected() {
        let mut config = ClientConfig::new("user:ABC");
        config.endpoint = "https://api.pinboard.in/v1?x=1".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn deserializes_with_default_endpoint() {
        let config: ClientConfig = serde_json::from_str(r#"{"token":"user:ABC"}"#).unwrap();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn debug_redacts_token() {
        let rendered = format!("{:?}", ClientConfig::new("user:SECRET"));
        assert!(!rendered.contains("SECRET"));
    }
}
