//! Error types for the fantasy data client

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FantasyApiError {
    /// Yahoo refused the bearer token
    #[error("Unauthorized: {body}")]
    Unauthorized { body: String },

    #[error("Yahoo API returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Invalid key: {key}")]
    InvalidKey { key: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
