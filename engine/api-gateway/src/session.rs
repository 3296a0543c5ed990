//! Signed session tokens handed to the browser after login

use crate::error::{GatewayError, GatewayResult};
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

pub const SESSION_ISSUER: &str = "fantasy-analyzer";
pub const SESSION_AUDIENCE: &str = "fantasy-analyzer-api";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Yahoo account id of the logged-in user
    pub sub: String,
    pub iss: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
}

pub struct SessionManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: i64,
}

impl SessionManager {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs: i64::try_from(ttl_secs).unwrap_or(i64::MAX / 2),
        }
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Issue a session token for `user_id`
    pub fn issue(&self, user_id: &str) -> GatewayResult<String> {
        self.issue_at(user_id, Utc::now())
    }

    pub fn issue_at(&self, user_id: &str, now: DateTime<Utc>) -> GatewayResult<String> {
        let iat = now.timestamp();
        let claims = SessionClaims {
            sub: user_id.to_string(),
            iss: SESSION_ISSUER.to_string(),
            aud: SESSION_AUDIENCE.to_string(),
            exp: iat.saturating_add(self.ttl_secs),
            iat,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            error!("Failed to sign session token: {}", e);
            GatewayError::Internal(format!("session signing failed: {}", e))
        })
    }

    /// Verify signature, issuer, audience and expiry
    pub fn validate(&self, token: &str) -> GatewayResult<SessionClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[SESSION_AUDIENCE]);
        validation.set_issuer(&[SESSION_ISSUER]);

        decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("Session token rejected: {}", e);
                GatewayError::Unauthorized(format!("invalid session token: {}", e))
            })
    }

    /// Extract and validate the token from an `Authorization: Bearer ...` header value
    pub fn authenticate(&self, header: Option<&str>) -> GatewayResult<SessionClaims> {
        let header = header.ok_or_else(|| GatewayError::Unauthorized("missing authorization header".to_string()))?;
        let token = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| GatewayError::Unauthorized("expected a bearer token".to_string()))?;

        self.validate(token)
    }
}
