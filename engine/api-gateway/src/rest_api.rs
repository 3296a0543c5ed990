//! REST API endpoints
//!
//! Login and callback drive the Yahoo OAuth flow and hand out a session token.
//! Every other `/api` route requires `Authorization: Bearer <session token>`,
//! resolves a valid Yahoo access token for the session's user and proxies the
//! request to the fantasy API, returning normalized records.

use crate::analyzers::{DraftAnalyzer, PerformanceAnalyzer, TradeAnalyzer};
use crate::error::{handle_rejection, GatewayError, GatewayResult};
use crate::session::{SessionClaims, SessionManager};
use account_service::{AccountServiceError, PendingStates, TokenGrant, TokenManager};
use fantasy_api::{FantasyClient, LeagueKey, PlayerKey, TeamKey};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{info, warn};
use warp::{Filter, Rejection, Reply};

/// Largest page the players endpoint will request from Yahoo
pub const MAX_PLAYERS_PER_PAGE: u32 = 100;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct ApiContext {
    pub tokens: Arc<TokenManager>,
    pub states: Arc<PendingStates>,
    pub sessions: Arc<SessionManager>,
    pub fantasy: Arc<FantasyClient>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub auth_url: String,
    pub state: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Set by Yahoo when the user declines access
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginSuccess {
    pub session_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user_id: String,
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LeaguesQuery {
    pub game_code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlayersQuery {
    pub start: Option<u32>,
    pub count: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RosterQuery {
    pub week: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub seasons: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PerformanceQuery {
    pub league_key: Option<String>,
}

fn reject(err: impl Into<GatewayError>) -> Rejection {
    warp::reject::custom(err.into())
}

fn parse_key<K>(raw: &str) -> Result<K, Rejection>
where
    K: std::str::FromStr<Err = fantasy_api::FantasyApiError>,
{
    raw.parse::<K>().map_err(reject)
}

async fn access_token(ctx: &ApiContext, claims: &SessionClaims) -> Result<String, Rejection> {
    ctx.tokens.get_valid_access_token(&claims.sub).await.map_err(reject)
}

/// Start the OAuth flow
pub async fn login(ctx: ApiContext) -> Result<impl Reply, Rejection> {
    let (auth_url, state) = ctx.tokens.oauth().authorize();
    ctx.states.issue(&state);

    info!(pending_states = ctx.states.len(), "Issued authorization redirect");
    Ok(warp::reply::json(&LoginResponse { auth_url, state }))
}

/// OAuth callback: verify state, redeem the code, persist tokens, issue a session
pub async fn auth_callback(params: CallbackParams, ctx: ApiContext) -> Result<impl Reply, Rejection> {
    let success = complete_login(params, &ctx).await.map_err(reject)?;
    Ok(warp::reply::json(&success))
}

async fn complete_login(params: CallbackParams, ctx: &ApiContext) -> GatewayResult<LoginSuccess> {
    if let Some(error) = params.error {
        return Err(GatewayError::BadRequest(format!("authorization denied: {}", error)));
    }
    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| GatewayError::BadRequest("missing authorization code".to_string()))?;

    let state = params.state.unwrap_or_default();
    if !ctx.states.consume(&state) {
        return Err(AccountServiceError::InvalidState.into());
    }

    let grant = ctx.tokens.oauth().exchange_code(&code).await?;
    let user_id = resolve_user_id(ctx, &grant).await?;
    ctx.tokens.record_login(&user_id, &grant).await?;

    let session_token = ctx.sessions.issue(&user_id)?;
    info!(user_id = %user_id, "Login complete");

    Ok(LoginSuccess {
        session_token,
        token_type: "Bearer".to_string(),
        expires_in: ctx.sessions.ttl_secs(),
        user_id,
        message: "Authentication successful".to_string(),
    })
}

/// Yahoo account id from userinfo, or the GUID in the token response when userinfo is unavailable
async fn resolve_user_id(ctx: &ApiContext, grant: &TokenGrant) -> GatewayResult<String> {
    match ctx.tokens.oauth().get_user_info(&grant.access_token).await {
        Ok(info) => Ok(info.sub),
        Err(e) if e.requires_reauthentication() => Err(e.into()),
        Err(e) => match grant.xoauth_yahoo_guid.clone().filter(|g| !g.is_empty()) {
            Some(guid) => {
                warn!(error = %e, "Userinfo unavailable, using GUID from token response");
                Ok(guid)
            }
            None => Err(e.into()),
        },
    }
}

pub async fn get_leagues(
    claims: SessionClaims,
    query: LeaguesQuery,
    ctx: ApiContext,
) -> Result<impl Reply, Rejection> {
    let token = access_token(&ctx, &claims).await?;
    let leagues = ctx
        .fantasy
        .user_leagues(&token, query.game_code.as_deref())
        .await
        .map_err(reject)?;
    Ok(warp::reply::json(&leagues))
}

pub async fn get_league(
    key: String,
    claims: SessionClaims,
    ctx: ApiContext,
) -> Result<impl Reply, Rejection> {
    let league: LeagueKey = parse_key(&key)?;
    let token = access_token(&ctx, &claims).await?;
    let record = ctx.fantasy.league(&token, &league).await.map_err(reject)?;
    Ok(warp::reply::json(&record))
}

/// Teams with their standings
pub async fn get_league_teams(
    key: String,
    claims: SessionClaims,
    ctx: ApiContext,
) -> Result<impl Reply, Rejection> {
    let league: LeagueKey = parse_key(&key)?;
    let token = access_token(&ctx, &claims).await?;
    let teams = ctx.fantasy.league_standings(&token, &league).await.map_err(reject)?;
    Ok(warp::reply::json(&teams))
}

pub async fn get_league_players(
    key: String,
    query: PlayersQuery,
    claims: SessionClaims,
    ctx: ApiContext,
) -> Result<impl Reply, Rejection> {
    let league: LeagueKey = parse_key(&key)?;
    let start = query.start.unwrap_or(0);
    let count = query.count.unwrap_or(25);
    if !(1..=MAX_PLAYERS_PER_PAGE).contains(&count) {
        return Err(reject(GatewayError::BadRequest(format!(
            "count must be between 1 and {}",
            MAX_PLAYERS_PER_PAGE
        ))));
    }

    let token = access_token(&ctx, &claims).await?;
    let players = ctx
        .fantasy
        .league_players(&token, &league, start, count)
        .await
        .map_err(reject)?;
    Ok(warp::reply::json(&players))
}

pub async fn get_draft_results(
    key: String,
    claims: SessionClaims,
    ctx: ApiContext,
) -> Result<impl Reply, Rejection> {
    let league: LeagueKey = parse_key(&key)?;
    let token = access_token(&ctx, &claims).await?;
    let picks = ctx.fantasy.draft_results(&token, &league).await.map_err(reject)?;
    Ok(warp::reply::json(&picks))
}

/// Nothing is mirrored locally, so there is nothing to sync
pub async fn sync_league(key: String, _claims: SessionClaims) -> Result<impl Reply, Rejection> {
    let league: LeagueKey = parse_key(&key)?;
    Ok(warp::reply::json(&serde_json::json!({
        "message": "League data is always fresh (proxied from Yahoo)",
        "league_key": league.to_string(),
    })))
}

pub async fn get_team_roster(
    key: String,
    query: RosterQuery,
    claims: SessionClaims,
    ctx: ApiContext,
) -> Result<impl Reply, Rejection> {
    let team: TeamKey = parse_key(&key)?;
    let token = access_token(&ctx, &claims).await?;
    let roster = ctx.fantasy.team_roster(&token, &team, query.week).await.map_err(reject)?;
    Ok(warp::reply::json(&roster))
}

pub async fn get_trade_analysis(key: String, _claims: SessionClaims) -> Result<impl Reply, Rejection> {
    let league: LeagueKey = parse_key(&key)?;
    let report = TradeAnalyzer.analyze_trades(&league).map_err(reject)?;
    Ok(warp::reply::json(&report))
}

pub async fn get_draft_analysis(key: String, _claims: SessionClaims) -> Result<impl Reply, Rejection> {
    let league: LeagueKey = parse_key(&key)?;
    let report = DraftAnalyzer.analyze_draft(&league).map_err(reject)?;
    Ok(warp::reply::json(&report))
}

pub async fn get_league_history(
    key: String,
    query: HistoryQuery,
    _claims: SessionClaims,
) -> Result<impl Reply, Rejection> {
    let league: LeagueKey = parse_key(&key)?;
    let history = PerformanceAnalyzer.league_history(&league, query.seasons).map_err(reject)?;
    Ok(warp::reply::json(&history))
}

pub async fn get_player_performance(
    key: String,
    query: PerformanceQuery,
    _claims: SessionClaims,
) -> Result<impl Reply, Rejection> {
    let player: PlayerKey = parse_key(&key)?;
    let league_key = query
        .league_key
        .ok_or_else(|| reject(GatewayError::BadRequest("league_key is required".to_string())))?;
    let league: LeagueKey = parse_key(&league_key)?;

    let report = PerformanceAnalyzer.player_trend(&player, &league).map_err(reject)?;
    Ok(warp::reply::json(&report))
}

fn with_context(ctx: ApiContext) -> impl Filter<Extract = (ApiContext,), Error = Infallible> + Clone {
    warp::any().map(move || ctx.clone())
}

/// Require a valid session token
fn with_session(
    sessions: Arc<SessionManager>,
) -> impl Filter<Extract = (SessionClaims,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization").and_then(move |header: Option<String>| {
        let sessions = sessions.clone();
        async move { sessions.authenticate(header.as_deref()).map_err(reject) }
    })
}

/// Create REST API routes
pub fn create_routes(
    ctx: ApiContext,
    cors_origins: &[String],
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    let session = with_session(ctx.sessions.clone());

    // Root and health endpoints
    let root = warp::path::end().and(warp::get()).map(|| {
        warp::reply::json(&serde_json::json!({
            "message": "Fantasy Hockey Analyzer API",
            "version": env!("CARGO_PKG_VERSION"),
        }))
    });

    let health = warp::path("health").and(warp::path::end()).and(warp::get()).map(|| {
        warp::reply::json(&serde_json::json!({
            "status": "healthy",
            "timestamp": chrono::Utc::now().to_rfc3339()
        }))
    });

    // OAuth flow
    let auth_login = warp::path!("api" / "auth" / "login")
        .and(warp::get())
        .and(with_context(ctx.clone()))
        .and_then(login);

    let auth_callback_route = warp::path!("api" / "auth" / "callback")
        .and(warp::get())
        .and(warp::query::<CallbackParams>())
        .and(with_context(ctx.clone()))
        .and_then(auth_callback);

    // Proxied fantasy data
    let leagues = warp::path!("api" / "leagues")
        .and(warp::get())
        .and(session.clone())
        .and(warp::query::<LeaguesQuery>())
        .and(with_context(ctx.clone()))
        .and_then(get_leagues);

    let league = warp::path!("api" / "league" / String)
        .and(warp::get())
        .and(session.clone())
        .and(with_context(ctx.clone()))
        .and_then(get_league);

    let league_teams = warp::path!("api" / "league" / String / "teams")
        .and(warp::get())
        .and(session.clone())
        .and(with_context(ctx.clone()))
        .and_then(get_league_teams);

    let league_players = warp::path!("api" / "league" / String / "players")
        .and(warp::get())
        .and(warp::query::<PlayersQuery>())
        .and(session.clone())
        .and(with_context(ctx.clone()))
        .and_then(get_league_players);

    let draft_results = warp::path!("api" / "league" / String / "draftresults")
        .and(warp::get())
        .and(session.clone())
        .and(with_context(ctx.clone()))
        .and_then(get_draft_results);

    let league_sync = warp::path!("api" / "league" / String / "sync")
        .and(warp::post())
        .and(session.clone())
        .and_then(sync_league);

    let team_roster = warp::path!("api" / "team" / String / "roster")
        .and(warp::get())
        .and(warp::query::<RosterQuery>())
        .and(session.clone())
        .and(with_context(ctx.clone()))
        .and_then(get_team_roster);

    // Analyzer capabilities
    let trade_analysis = warp::path!("api" / "league" / String / "analysis" / "trades")
        .and(warp::get())
        .and(session.clone())
        .and_then(get_trade_analysis);

    let draft_analysis = warp::path!("api" / "league" / String / "analysis" / "draft")
        .and(warp::get())
        .and(session.clone())
        .and_then(get_draft_analysis);

    let league_history = warp::path!("api" / "league" / String / "history")
        .and(warp::get())
        .and(warp::query::<HistoryQuery>())
        .and(session.clone())
        .and_then(get_league_history);

    let player_performance = warp::path!("api" / "player" / String / "performance")
        .and(warp::get())
        .and(warp::query::<PerformanceQuery>())
        .and(session)
        .and_then(get_player_performance);

    let cors = warp::cors()
        .allow_origins(cors_origins.iter().map(String::as_str))
        .allow_headers(vec!["authorization", "content-type"])
        .allow_methods(vec!["GET", "POST", "OPTIONS"])
        .allow_credentials(true);

    // Combine all routes
    root.or(health)
        .or(auth_login)
        .or(auth_callback_route)
        .or(leagues)
        .or(league)
        .or(league_teams)
        .or(league_players)
        .or(draft_results)
        .or(league_sync)
        .or(team_roster)
        .or(trade_analysis)
        .or(draft_analysis)
        .or(league_history)
        .or(player_performance)
        .recover(handle_rejection)
        .with(cors)
        // Disallowed origins are rejected by the CORS layer itself
        .recover(handle_rejection)
        .with(warp::trace::request())
}

#[cfg(test)]
mod tests {
    use super::*;
    use account_service::config::{DatabaseConfig, OAuthConfig};
    use account_service::{User, UserStore, YahooOAuthClient};
    use chrono::{Duration, Utc};
    use fantasy_api::ApiConfig;
    use serde_json::{json, Value};
    use warp::http::StatusCode;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup() -> (MockServer, ApiContext) {
        let server = MockServer::start().await;

        let oauth = YahooOAuthClient::new(OAuthConfig {
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
            redirect_url: "https://localhost:8000/api/auth/callback".to_string(),
            auth_url: format!("{}/oauth2/request_auth", server.uri()),
            token_url: format!("{}/oauth2/get_token", server.uri()),
            userinfo_url: format!("{}/openid/v1/userinfo", server.uri()),
            request_timeout_secs: 5,
            state_ttl_secs: 600,
        })
        .unwrap();
        let store = UserStore::connect(&DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        })
        .await
        .unwrap();
        let fantasy = FantasyClient::new(&ApiConfig {
            base_url: format!("{}/fantasy/v2", server.uri()),
            request_timeout_secs: 5,
        })
        .unwrap();

        let ctx = ApiContext {
            tokens: Arc::new(TokenManager::new(store, Arc::new(oauth))),
            states: Arc::new(PendingStates::new(600)),
            sessions: Arc::new(SessionManager::new("test-secret", 3600)),
            fantasy: Arc::new(fantasy),
        };
        (server, ctx)
    }

    /// Store a user with a valid Yahoo token and return a session header for them
    async fn logged_in(ctx: &ApiContext) -> String {
        ctx.tokens
            .store()
            .upsert(&User {
                user_id: "GUID1".to_string(),
                access_token: "yahoo-access".to_string(),
                refresh_token: "yahoo-refresh".to_string(),
                token_expires_at: Utc::now() + Duration::hours(1),
            })
            .await
            .unwrap();
        format!("Bearer {}", ctx.sessions.issue("GUID1").unwrap())
    }

    async fn get(ctx: &ApiContext, uri: &str, auth: Option<&str>) -> (StatusCode, Value) {
        let routes = create_routes(ctx.clone(), &[]);
        let mut request = warp::test::request().method("GET").path(uri);
        if let Some(auth) = auth {
            request = request.header("authorization", auth);
        }
        let response = request.reply(&routes).await;
        let body = serde_json::from_slice(response.body()).unwrap_or(Value::Null);
        (response.status(), body)
    }

    fn token_grant() -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "yahoo-access",
            "refresh_token": "yahoo-refresh",
            "expires_in": 3600,
            "token_type": "bearer",
            "xoauth_yahoo_guid": "GUID-FROM-TOKEN"
        }))
    }

    #[tokio::test]
    async fn test_root_and_health() {
        let (_server, ctx) = setup().await;

        let (status, body) = get(&ctx, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let (status, body) = get(&ctx, "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Fantasy Hockey Analyzer API");
    }

    #[tokio::test]
    async fn test_login_registers_state() {
        let (_server, ctx) = setup().await;

        let (status, body) = get(&ctx, "/api/auth/login", None).await;
        assert_eq!(status, StatusCode::OK);

        let state = body["state"].as_str().unwrap();
        assert!(body["auth_url"].as_str().unwrap().contains(state));
        assert_eq!(ctx.states.len(), 1);
    }

    #[tokio::test]
    async fn test_callback_completes_login_once() {
        let (server, ctx) = setup().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/get_token"))
            .respond_with(token_grant())
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/openid/v1/userinfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sub": "GUID1" })))
            .mount(&server)
            .await;

        let (_, login) = get(&ctx, "/api/auth/login", None).await;
        let state = login["state"].as_str().unwrap().to_string();
        let uri = format!("/api/auth/callback?code=abc&state={}", state);

        let (status, body) = get(&ctx, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user_id"], "GUID1");

        let claims = ctx.sessions.validate(body["session_token"].as_str().unwrap()).unwrap();
        assert_eq!(claims.sub, "GUID1");
        let stored = ctx.tokens.store().get("GUID1").await.unwrap().unwrap();
        assert_eq!(stored.refresh_token, "yahoo-refresh");

        // The state was consumed by the first callback
        let (status, body) = get(&ctx, &uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_STATE");
    }

    #[tokio::test]
    async fn test_callback_falls_back_to_token_guid() {
        let (server, ctx) = setup().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/get_token"))
            .respond_with(token_grant())
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/openid/v1/userinfo"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        ctx.states.issue("known-state");
        let (status, body) = get(&ctx, "/api/auth/callback?code=abc&state=known-state", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user_id"], "GUID-FROM-TOKEN");
    }

    #[tokio::test]
    async fn test_callback_rejects_unknown_state() {
        let (server, ctx) = setup().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/get_token"))
            .respond_with(token_grant())
            .expect(0)
            .mount(&server)
            .await;

        let (status, body) = get(&ctx, "/api/auth/callback?code=abc&state=forged", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_STATE");

        let (status, body) = get(&ctx, "/api/auth/callback?state=forged", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_api_requires_session() {
        let (_server, ctx) = setup().await;

        let (status, body) = get(&ctx, "/api/leagues", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");

        let (status, _) = get(&ctx, "/api/leagues", Some("Bearer GUID1")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_leagues_are_proxied_and_normalized() {
        let (server, ctx) = setup().await;
        let auth = logged_in(&ctx).await;
        Mock::given(method("GET"))
            .and(path("/fantasy/v2/users;use_login=1/games/leagues"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "fantasy_content": { "users": { "0": { "user": [
                    { "guid": "GUID1" },
                    { "games": {
                        "0": { "game": [
                            { "code": "nhl", "season": "2025" },
                            { "leagues": { "0": { "league": [ { "league_key": "465.l.34948", "name": "Beer League" } ] }, "count": 1 } }
                        ] },
                        "count": 1
                    } }
                ] }, "count": 1 } }
            })))
            .mount(&server)
            .await;

        let (status, body) = get(&ctx, "/api/leagues?game_code=nhl", Some(&auth)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["league_key"], "465.l.34948");
        assert_eq!(body[0]["season"], 2025);

        let (_, body) = get(&ctx, "/api/leagues?game_code=nfl", Some(&auth)).await;
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_league_teams_use_standings() {
        let (server, ctx) = setup().await;
        let auth = logged_in(&ctx).await;
        Mock::given(method("GET"))
            .and(path("/fantasy/v2/league/465.l.34948/standings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "fantasy_content": { "league": [
                    { "league_key": "465.l.34948" },
                    { "standings": [ { "teams": {
                        "0": { "team": [
                            [ { "team_key": "465.l.34948.t.1" }, { "name": "Ice Holes" } ],
                            { "team_standings": { "rank": "2" } }
                        ] },
                        "count": 1
                    } } ] }
                ] }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (status, body) = get(&ctx, "/api/league/465.l.34948/teams", Some(&auth)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["name"], "Ice Holes");
        assert_eq!(body[0]["rank"], 2);
        assert_eq!(body[0]["wins"], Value::Null);
    }

    #[tokio::test]
    async fn test_players_page_size_is_bounded() {
        let (_server, ctx) = setup().await;
        let auth = logged_in(&ctx).await;

        let (status, body) = get(&ctx, "/api/league/465.l.34948/players?count=500", Some(&auth)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");

        let (status, _) = get(&ctx, "/api/league/465.l.34948/players?count=0", Some(&auth)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_yahoo_401_asks_for_reauthentication() {
        let (server, ctx) = setup().await;
        let auth = logged_in(&ctx).await;
        Mock::given(method("GET"))
            .and(path("/fantasy/v2/league/465.l.34948/draftresults"))
            .respond_with(ResponseTemplate::new(401).set_body_string("token_rejected"))
            .mount(&server)
            .await;

        let (status, body) = get(&ctx, "/api/league/465.l.34948/draftresults", Some(&auth)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "REAUTHENTICATE");
    }

    #[tokio::test]
    async fn test_upstream_error_is_502_with_details() {
        let (server, ctx) = setup().await;
        let auth = logged_in(&ctx).await;
        Mock::given(method("GET"))
            .and(path("/fantasy/v2/team/465.l.34948.t.1/roster;week=3"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let (status, body) = get(&ctx, "/api/team/465.l.34948.t.1/roster?week=3", Some(&auth)).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "UPSTREAM_ERROR");
        assert_eq!(body["error"]["details"]["upstream_status"], 503);
        assert_eq!(body["error"]["details"]["body"], "maintenance");
    }

    #[tokio::test]
    async fn test_malformed_key_is_rejected() {
        let (_server, ctx) = setup().await;
        let auth = logged_in(&ctx).await;

        let (status, body) = get(&ctx, "/api/league/not-a-key", Some(&auth)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_KEY");
    }

    #[tokio::test]
    async fn test_analysis_routes_are_not_implemented() {
        let (_server, ctx) = setup().await;
        let auth = logged_in(&ctx).await;

        for (uri, capability) in [
            ("/api/league/465.l.34948/analysis/draft", "draft_grades"),
            ("/api/league/465.l.34948/analysis/trades", "trade_targets"),
            ("/api/league/465.l.34948/history", "league_history"),
            ("/api/player/465.p.6743/performance?league_key=465.l.34948", "performance_trend"),
        ] {
            let (status, body) = get(&ctx, uri, Some(&auth)).await;
            assert_eq!(status, StatusCode::NOT_IMPLEMENTED, "{}", uri);
            assert_eq!(body["error"]["details"]["capability"], capability);
        }

        let (status, _) = get(&ctx, "/api/player/465.p.6743/performance", Some(&auth)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_sync_is_a_no_op() {
        let (_server, ctx) = setup().await;
        let auth = logged_in(&ctx).await;
        let routes = create_routes(ctx.clone(), &[]);

        let response = warp::test::request()
            .method("POST")
            .path("/api/league/465.l.34948/sync")
            .header("authorization", &auth)
            .reply(&routes)
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["league_key"], "465.l.34948");
    }

    #[tokio::test]
    async fn test_error_replies_carry_cors_headers() {
        let (_server, ctx) = setup().await;
        let routes = create_routes(ctx, &["http://localhost:3000".to_string()]);

        let response = warp::test::request()
            .method("GET")
            .path("/api/leagues")
            .header("origin", "http://localhost:3000")
            .reply(&routes)
            .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get("access-control-allow-origin").map(|v| v.to_str().unwrap()),
            Some("http://localhost:3000")
        );
    }

    #[tokio::test]
    async fn test_disallowed_origin_is_forbidden() {
        let (_server, ctx) = setup().await;
        let routes = create_routes(ctx, &["http://localhost:3000".to_string()]);

        let response = warp::test::request()
            .method("GET")
            .path("/health")
            .header("origin", "https://evil.example.com")
            .reply(&routes)
            .await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body: Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["error"]["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404_envelope() {
        let (_server, ctx) = setup().await;

        let (status, body) = get(&ctx, "/api/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }
}
