//! Configuration for AccountService

use crate::state::MAX_STATE_TTL_SECS;
use crate::AccountServiceError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_AUTH_URL: &str = "https://api.login.yahoo.com/oauth2/request_auth";
pub const DEFAULT_TOKEN_URL: &str = "https://api.login.yahoo.com/oauth2/get_token";
pub const DEFAULT_USERINFO_URL: &str = "https://api.login.yahoo.com/openid/v1/userinfo";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://fantasy_hockey.db";

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Yahoo OAuth configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
    /// Upper bound for every request to the token and userinfo endpoints
    pub request_timeout_secs: u64,
    /// How long an issued anti-forgery state stays redeemable
    pub state_ttl_secs: u64,
}

/// AccountService configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountServiceConfig {
    pub database: DatabaseConfig,
    pub oauth: OAuthConfig,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { url: DEFAULT_DATABASE_URL.to_string(), max_connections: 5 }
    }
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_url: String::new(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            userinfo_url: DEFAULT_USERINFO_URL.to_string(),
            request_timeout_secs: 30,
            state_ttl_secs: 600,
        }
    }
}

impl AccountServiceConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self, AccountServiceError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary key lookup (the process environment in production)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AccountServiceError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).filter(|v| !v.trim().is_empty()).ok_or_else(|| {
                AccountServiceError::InvalidConfig { message: format!("{} not set", key) }
            })
        };
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let defaults = OAuthConfig::default();

        let oauth = OAuthConfig {
            client_id: required("YAHOO_CLIENT_ID")?,
            client_secret: required("YAHOO_CLIENT_SECRET")?,
            redirect_url: required("YAHOO_REDIRECT_URI")?,
            auth_url: or_default("YAHOO_AUTH_URL", DEFAULT_AUTH_URL),
            token_url: or_default("YAHOO_TOKEN_URL", DEFAULT_TOKEN_URL),
            userinfo_url: or_default("YAHOO_USERINFO_URL", DEFAULT_USERINFO_URL),
            request_timeout_secs: parse_number(
                &lookup,
                "HTTP_TIMEOUT_SECS",
                defaults.request_timeout_secs,
            )?,
            state_ttl_secs: parse_number(&lookup, "OAUTH_STATE_TTL_SECS", defaults.state_ttl_secs)?,
        };

        if oauth.state_ttl_secs == 0 || oauth.state_ttl_secs > MAX_STATE_TTL_SECS {
            return Err(AccountServiceError::InvalidConfig {
                message: format!("OAUTH_STATE_TTL_SECS must be between 1 and {}", MAX_STATE_TTL_SECS),
            });
        }

        let database = DatabaseConfig {
            url: or_default("DATABASE_URL", DEFAULT_DATABASE_URL),
            max_connections: parse_number(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?,
        };

        Ok(Self { database, oauth })
    }
}

fn parse_number<F, T>(lookup: &F, key: &str, default: T) -> Result<T, AccountServiceError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| AccountServiceError::InvalidConfig { message: format!("Invalid {}", key) }),
        None => Ok(default),
    }
}
