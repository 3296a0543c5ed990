//! Fantasy analyzer REST server

use account_service::{AccountServiceConfig, PendingStates, TokenManager, UserStore, YahooOAuthClient};
use anyhow::{Context, Result};
use api_gateway::logging::initialize_logging;
use api_gateway::{create_routes, ApiContext, GatewayConfig, SessionManager};
use fantasy_api::{ApiConfig, FantasyClient};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    let config = GatewayConfig::from_env()?;
    initialize_logging(&config.logging.level, &config.logging.format)?;

    info!("Starting fantasy analyzer gateway v{}", api_gateway::VERSION);

    let account_config = AccountServiceConfig::from_env()?;
    let store = UserStore::connect(&account_config.database)
        .await
        .context("Failed to open user store")?;
    let state_ttl_secs = account_config.oauth.state_ttl_secs;
    let oauth = Arc::new(YahooOAuthClient::new(account_config.oauth)?);

    let fantasy = FantasyClient::new(&ApiConfig::from_env()?)?;

    let ctx = ApiContext {
        tokens: Arc::new(TokenManager::new(store, oauth)),
        states: Arc::new(PendingStates::new(state_ttl_secs)),
        sessions: Arc::new(SessionManager::new(&config.session.secret_key, config.session.ttl_secs)),
        fantasy: Arc::new(fantasy),
    };

    let routes = create_routes(ctx, &config.cors_allowed_origins);

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.bind_address()))?;

    info!(
        allowed_origins = ?config.cors_allowed_origins,
        "REST API listening on http://{}", addr
    );

    warp::serve(routes).run(addr).await;

    Ok(())
}
