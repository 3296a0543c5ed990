//! Configuration for the API gateway

use crate::error::GatewayError;
use serde::{Deserialize, Serialize};

/// Origins allowed by default: the React and Vite dev servers over http and https
pub const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "https://localhost:3000",
    "http://localhost:3001",
    "https://localhost:3001",
    "http://localhost:5173",
    "https://localhost:5173",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub secret_key: String,
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub cors_allowed_origins: Vec<String>,
    pub logging: LoggingConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 8000 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "compact".to_string() }
    }
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, GatewayError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, GatewayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret_key = lookup("SECRET_KEY")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| GatewayError::Config("SECRET_KEY not set".to_string()))?;

        let server_defaults = ServerConfig::default();
        let server = ServerConfig {
            host: lookup("SERVER_HOST").unwrap_or(server_defaults.host),
            port: parse_or(&lookup, "SERVER_PORT", server_defaults.port)?,
        };

        let session = SessionConfig {
            secret_key,
            ttl_secs: parse_or(&lookup, "SESSION_TTL_SECS", 86_400)?,
        };

        let cors_allowed_origins: Vec<String> = match lookup("CORS_ALLOWED_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect(),
            None => DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
        };
        if let Some(bad) = cors_allowed_origins.iter().find(|origin| !is_valid_origin(origin)) {
            return Err(GatewayError::Config(format!("Invalid CORS origin: {}", bad)));
        }

        let logging_defaults = LoggingConfig::default();
        let logging = LoggingConfig {
            level: lookup("LOG_LEVEL").map(|l| l.to_lowercase()).unwrap_or(logging_defaults.level),
            format: lookup("LOG_FORMAT").map(|f| f.to_lowercase()).unwrap_or(logging_defaults.format),
        };

        Ok(Self { server, session, cors_allowed_origins, logging })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// `scheme://host[:port]` with an http(s) scheme and no path
fn is_valid_origin(origin: &str) -> bool {
    match origin.split_once("://") {
        Some((scheme, authority)) => {
            matches!(scheme, "http" | "https") && !authority.is_empty() && !authority.contains('/')
        }
        None => false,
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, GatewayError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| GatewayError::Config(format!("Invalid {}", key))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::from_lookup(|key| match key {
            "SECRET_KEY" => Some("s3cret".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8000");
        assert_eq!(config.session.ttl_secs, 86_400);
        assert_eq!(config.cors_allowed_origins.len(), 6);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_overrides() {
        let config = GatewayConfig::from_lookup(|key| {
            let value = match key {
                "SECRET_KEY" => "s3cret",
                "SERVER_PORT" => "9001",
                "CORS_ALLOWED_ORIGINS" => "https://app.example.com, ,http://localhost:3000",
                "LOG_FORMAT" => "JSON",
                _ => return None,
            };
            Some(value.to_string())
        })
        .unwrap();

        assert_eq!(config.server.port, 9001);
        assert_eq!(
            config.cors_allowed_origins,
            vec!["https://app.example.com".to_string(), "http://localhost:3000".to_string()]
        );
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_malformed_origin_is_rejected() {
        let err = GatewayConfig::from_lookup(|key| match key {
            "SECRET_KEY" => Some("s3cret".to_string()),
            "CORS_ALLOWED_ORIGINS" => Some("localhost:3000".to_string()),
            _ => None,
        })
        .unwrap_err();
        assert!(err.to_string().contains("localhost:3000"));
    }

    #[test]
    fn test_secret_key_required() {
        assert!(matches!(GatewayConfig::from_lookup(|_| None), Err(GatewayError::Config(_))));
    }
}
