//! Error types for AccountService

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AccountServiceError {
    /// The stored credentials can no longer be used; the user has to log in again.
    #[error("Reauthentication required: {message}")]
    ReauthenticationRequired { message: String },

    #[error("Token endpoint returned {status}: {body}")]
    TokenEndpoint { status: u16, body: String },

    #[error("Invalid token response: {message}")]
    InvalidTokenResponse { message: String },

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: String },

    #[error("Unknown or expired OAuth state")]
    InvalidState,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl AccountServiceError {
    /// True when the caller must send the user back through the login flow.
    pub fn requires_reauthentication(&self) -> bool {
        matches!(self, AccountServiceError::ReauthenticationRequired { .. })
    }
}
