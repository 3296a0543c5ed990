//! AccountService - Yahoo OAuth token lifecycle and user token storage
//!
//! This crate owns everything that touches a user's Yahoo credentials: building
//! the authorization redirect, redeeming the callback code, persisting the token
//! pair, and handing out an access token that is guaranteed not to be past its
//! recorded expiry.

pub mod account;
pub mod config;
pub mod error;
pub mod oauth;
pub mod state;
pub mod store;
pub mod tokens;

pub use account::User;
pub use config::AccountServiceConfig;
pub use error::AccountServiceError;
pub use oauth::{TokenGrant, YahooOAuthClient, YahooUserInfo};
pub use state::PendingStates;
pub use store::UserStore;
pub use tokens::TokenManager;

// Result type alias
pub type Result<T> = std::result::Result<T, AccountServiceError>;

/// Lifetime assumed for an access token when the token endpoint omits `expires_in`
pub const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;
