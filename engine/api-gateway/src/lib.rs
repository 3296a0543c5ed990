//! ApiGateway - REST interface for the fantasy league analyzer
//!
//! Serves the OAuth login flow, issues session tokens, proxies league data
//! from Yahoo as normalized JSON and exports leagues to CSV.

pub mod analyzers;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod rest_api;
pub mod session;

pub use config::GatewayConfig;
pub use error::{GatewayError, GatewayResult};
pub use rest_api::{create_routes, ApiContext};
pub use session::{SessionClaims, SessionManager};

/// Version of the gateway API
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
