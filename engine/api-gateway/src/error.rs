//! Error types for the API gateway and their HTTP mapping

use account_service::AccountServiceError;
use fantasy_api::FantasyApiError;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::{error, warn};
use warp::http::StatusCode;
use warp::{Rejection, Reply};

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error(transparent)]
    Account(#[from] AccountServiceError),

    #[error(transparent)]
    Fantasy(#[from] FantasyApiError),

    /// Missing, malformed or expired session token
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("{capability} is not implemented")]
    NotImplemented { capability: &'static str },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl warp::reject::Reject for GatewayError {}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
    pub timestamp: String,
}

/// Error detail
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: &str, message: impl Into<String>, details: Option<serde_json::Value>) -> Self {
        Self {
            error: ErrorDetail { code: code.to_string(), message: message.into(), details },
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl GatewayError {
    /// HTTP status, error code and optional details for this error
    pub fn classify(&self) -> (StatusCode, &'static str, Option<serde_json::Value>) {
        use serde_json::json;

        match self {
            GatewayError::Account(e) => match e {
                AccountServiceError::ReauthenticationRequired { .. }
                | AccountServiceError::UserNotFound { .. } => {
                    (StatusCode::UNAUTHORIZED, "REAUTHENTICATE", None)
                }
                AccountServiceError::InvalidState => (StatusCode::BAD_REQUEST, "INVALID_STATE", None),
                AccountServiceError::TokenEndpoint { status, body } => (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_ERROR",
                    Some(json!({ "upstream_status": status, "body": body })),
                ),
                AccountServiceError::InvalidTokenResponse { .. } | AccountServiceError::HttpError(_) => {
                    (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", None)
                }
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", None),
            },
            GatewayError::Fantasy(e) => match e {
                FantasyApiError::Unauthorized { .. } => {
                    (StatusCode::UNAUTHORIZED, "REAUTHENTICATE", None)
                }
                FantasyApiError::Upstream { status, body } => (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_ERROR",
                    Some(json!({ "upstream_status": status, "body": body })),
                ),
                FantasyApiError::InvalidKey { .. } => (StatusCode::BAD_REQUEST, "INVALID_KEY", None),
                FantasyApiError::Http(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", None),
                FantasyApiError::InvalidConfig { .. } => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", None)
                }
            },
            GatewayError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", None),
            GatewayError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", None),
            GatewayError::NotImplemented { capability } => (
                StatusCode::NOT_IMPLEMENTED,
                "NOT_IMPLEMENTED",
                Some(json!({ "capability": capability })),
            ),
            GatewayError::Config(_) | GatewayError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", None)
            }
        }
    }

    pub fn to_response(&self) -> (StatusCode, ErrorResponse) {
        let (status, code, details) = self.classify();
        if status.is_server_error() {
            error!(code, error = %self, "Request failed");
        } else {
            warn!(code, error = %self, "Request rejected");
        }
        (status, ErrorResponse::new(code, self.to_string(), details))
    }
}

/// Turn every rejection into the JSON error envelope
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, body) = if let Some(e) = err.find::<GatewayError>() {
        e.to_response()
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, ErrorResponse::new("NOT_FOUND", "Route not found", None))
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        (StatusCode::BAD_REQUEST, ErrorResponse::new("BAD_REQUEST", e.to_string(), None))
    } else if let Some(e) = err.find::<warp::reject::MissingHeader>() {
        (StatusCode::UNAUTHORIZED, ErrorResponse::new("UNAUTHORIZED", e.to_string(), None))
    } else if let Some(e) = err.find::<warp::cors::CorsForbidden>() {
        (StatusCode::FORBIDDEN, ErrorResponse::new("FORBIDDEN", e.to_string(), None))
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            ErrorResponse::new("METHOD_NOT_ALLOWED", "Method not allowed", None),
        )
    } else {
        error!(rejection = ?err, "Unhandled rejection");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorResponse::new("INTERNAL", "Internal server error", None),
        )
    };

    Ok(warp::reply::with_status(warp::reply::json(&body), status))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reauthentication_maps_to_401() {
        let err = GatewayError::from(AccountServiceError::ReauthenticationRequired {
            message: "invalid_grant".to_string(),
        });
        let (status, code, _) = err.classify();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(code, "REAUTHENTICATE");

        let err = GatewayError::from(FantasyApiError::Unauthorized { body: String::new() });
        assert_eq!(err.classify().1, "REAUTHENTICATE");
    }

    #[test]
    fn test_upstream_failure_carries_status_and_body() {
        let err = GatewayError::from(FantasyApiError::Upstream { status: 503, body: "busy".to_string() });
        let (status, code, details) = err.classify();
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(code, "UPSTREAM_ERROR");
        let details = details.unwrap();
        assert_eq!(details["upstream_status"], 503);
        assert_eq!(details["body"], "busy");
    }

    #[test]
    fn test_not_implemented_names_capability() {
        let err = GatewayError::NotImplemented { capability: "draft_grades" };
        let (status, response) = err.to_response();
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
        assert_eq!(response.error.code, "NOT_IMPLEMENTED");
        assert_eq!(response.error.details.unwrap()["capability"], "draft_grades");
    }

    #[test]
    fn test_invalid_state_and_key_are_client_errors() {
        assert_eq!(
            GatewayError::from(AccountServiceError::InvalidState).classify().0,
            StatusCode::BAD_REQUEST
        );
        let err = GatewayError::from(FantasyApiError::InvalidKey { key: "x".to_string() });
        assert_eq!(err.classify().1, "INVALID_KEY");
    }
}
