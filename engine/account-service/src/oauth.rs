//! Yahoo OAuth 2.0 integration

use crate::config::OAuthConfig;
use crate::{AccountServiceError, Result};
use oauth2::{basic::BasicClient, AuthUrl, ClientId, ClientSecret, CsrfToken, RedirectUrl, TokenUrl};
use reqwest::header::ACCEPT;
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Bytes of entropy in every anti-forgery state value
pub const STATE_ENTROPY_BYTES: u32 = 32;

/// Token endpoint response, for both code exchange and refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    /// Absent on some refresh responses
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Seconds until `access_token` expires
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Yahoo includes the account GUID on code exchange
    #[serde(default)]
    pub xoauth_yahoo_guid: Option<String>,
}

/// OpenID userinfo response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YahooUserInfo {
    pub sub: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Yahoo OAuth client
#[derive(Debug)]
pub struct YahooOAuthClient {
    config: OAuthConfig,
    client: BasicClient,
    http: reqwest::Client,
}

impl YahooOAuthClient {
    /// Create a new Yahoo OAuth client
    pub fn new(config: OAuthConfig) -> Result<Self> {
        let client = BasicClient::new(
            ClientId::new(config.client_id.clone()),
            Some(ClientSecret::new(config.client_secret.clone())),
            AuthUrl::new(config.auth_url.clone()).map_err(|e| AccountServiceError::InvalidConfig {
                message: format!("Invalid auth URL: {}", e),
            })?,
            Some(TokenUrl::new(config.token_url.clone()).map_err(|e| {
                AccountServiceError::InvalidConfig { message: format!("Invalid token URL: {}", e) }
            })?),
        )
        .set_redirect_uri(RedirectUrl::new(config.redirect_url.clone()).map_err(|e| {
            AccountServiceError::InvalidConfig { message: format!("Invalid redirect URL: {}", e) }
        })?);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self { config, client, http })
    }

    /// Authorization URL plus the anti-forgery state embedded in it.
    ///
    /// The caller must remember the state and check it when the callback arrives.
    pub fn authorize(&self) -> (String, String) {
        let (auth_url, csrf_token) =
            self.client.authorize_url(|| CsrfToken::new_random_len(STATE_ENTROPY_BYTES)).url();

        debug!(redirect_uri = %self.config.redirect_url, "Generated authorization URL");
        (auth_url.to_string(), csrf_token.secret().clone())
    }

    /// Exchange an authorization code for a token pair.
    ///
    /// Client credentials go in the form body first; if Yahoo rejects that, the
    /// request is repeated once with HTTP Basic client authentication.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenGrant> {
        info!("Exchanging authorization code for tokens");

        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_url.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];

        let response = self
            .http
            .post(&self.config.token_url)
            .header(ACCEPT, "application/json")
            .form(&params)
            .send()
            .await?;

        let response = if response.status().is_success() {
            response
        } else {
            warn!(
                status = response.status().as_u16(),
                "Token exchange rejected with body credentials, retrying with basic auth"
            );

            let basic_params = [
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.config.redirect_url.as_str()),
            ];

            self.http
                .post(&self.config.token_url)
                .header(ACCEPT, "application/json")
                .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
                .form(&basic_params)
                .send()
                .await?
        };

        let grant = read_grant(response).await?;
        if grant.refresh_token.as_deref().map_or(true, str::is_empty) {
            return Err(AccountServiceError::InvalidTokenResponse {
                message: "code exchange returned no refresh token".to_string(),
            });
        }

        info!(expires_in = ?grant.expires_in, "Successfully exchanged code for access token");
        Ok(grant)
    }

    /// Use a refresh token to obtain a new access token
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .http
            .post(&self.config.token_url)
            .header(ACCEPT, "application/json")
            .form(&params)
            .send()
            .await?;

        let grant = read_grant(response).await?;
        debug!(
            rotated = grant.refresh_token.is_some(),
            expires_in = ?grant.expires_in,
            "Refreshed access token"
        );
        Ok(grant)
    }

    /// Get user info from access token
    pub async fn get_user_info(&self, access_token: &str) -> Result<YahooUserInfo> {
        let response = self
            .http
            .get(&self.config.userinfo_url)
            .bearer_auth(access_token)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, body));
        }

        let user_info: YahooUserInfo = response.json().await?;
        Ok(user_info)
    }
}

async fn read_grant(response: Response) -> Result<TokenGrant> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        warn!(status = status.as_u16(), "Token endpoint request failed");
        return Err(classify_failure(status, body));
    }

    serde_json::from_str::<TokenGrant>(&body).map_err(|e| AccountServiceError::InvalidTokenResponse {
        message: format!("failed to parse token response: {}", e),
    })
}

/// 400/401 mean the code or refresh token is no good; anything else is an upstream fault.
fn classify_failure(status: StatusCode, body: String) -> AccountServiceError {
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
            AccountServiceError::ReauthenticationRequired {
                message: format!("Yahoo rejected credentials ({}): {}", status.as_u16(), body),
            }
        }
        _ => AccountServiceError::TokenEndpoint { status: status.as_u16(), body },
    }
}
