//! Access-token lifecycle: record logins, hand out valid tokens, refresh on expiry

use crate::oauth::{TokenGrant, YahooOAuthClient};
use crate::store::UserStore;
use crate::{AccountServiceError, Result, User};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

pub struct TokenManager {
    store: UserStore,
    oauth: Arc<YahooOAuthClient>,
    // One refresh in flight per user
    refresh_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl TokenManager {
    pub fn new(store: UserStore, oauth: Arc<YahooOAuthClient>) -> Self {
        Self { store, oauth, refresh_locks: DashMap::new() }
    }

    pub fn store(&self) -> &UserStore {
        &self.store
    }

    pub fn oauth(&self) -> &YahooOAuthClient {
        &self.oauth
    }

    /// Persist the token pair obtained from a successful code exchange
    pub async fn record_login(&self, user_id: &str, grant: &TokenGrant) -> Result<User> {
        let refresh_token = grant
            .refresh_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AccountServiceError::InvalidTokenResponse {
                message: "login grant has no refresh token".to_string(),
            })?;

        // Serialized with refreshes for the same user
        let lock = self.lock_for(user_id);
        let _guard = lock.lock().await;

        let user = User::from_grant(user_id, refresh_token, grant, Utc::now());
        self.store.upsert(&user).await?;

        info!(user_id = %user_id, expires_at = %user.token_expires_at, "Recorded login");
        Ok(user)
    }

    /// Return an access token that is not past its recorded expiry, refreshing first if needed.
    ///
    /// A rejected refresh surfaces as [`AccountServiceError::ReauthenticationRequired`];
    /// the stored record is left as it was.
    pub async fn get_valid_access_token(&self, user_id: &str) -> Result<String> {
        let lock = self.lock_for(user_id);
        let _guard = lock.lock().await;

        // Re-read under the lock so a refresh that just finished is observed
        let mut user = self.store.require(user_id).await?;
        if user.is_access_token_valid(Utc::now()) {
            return Ok(user.access_token);
        }

        info!(user_id = %user_id, expired_at = %user.token_expires_at, "Access token expired, refreshing");

        let grant = match self.oauth.refresh(&user.refresh_token).await {
            Ok(grant) => grant,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Token refresh failed");
                return Err(e);
            }
        };

        user.apply_refresh(&grant, Utc::now());
        self.store.upsert(&user).await?;

        Ok(user.access_token)
    }

    fn lock_for(&self, user_id: &str) -> Arc<Mutex<()>> {
        self.refresh_locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
