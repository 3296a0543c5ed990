//! Configuration for the fantasy data client

use crate::FantasyApiError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://fantasysports.yahooapis.com/fantasy/v2";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_BASE_URL.to_string(), request_timeout_secs: 30 }
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, FantasyApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, FantasyApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let base_url = lookup("YAHOO_API_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.base_url);

        let request_timeout_secs = match lookup("HTTP_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse().map_err(|_| FantasyApiError::InvalidConfig {
                message: "Invalid HTTP_TIMEOUT_SECS".to_string(),
            })?,
            None => defaults.request_timeout_secs,
        };

        Ok(Self { base_url, request_timeout_secs })
    }
}
