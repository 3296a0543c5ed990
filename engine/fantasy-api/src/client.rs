//! Outbound client for the Yahoo Fantasy Sports v2 API

use crate::config::ApiConfig;
use crate::keys::{LeagueKey, TeamKey};
use crate::normalize::{
    normalize_draft_results, normalize_league, normalize_players, normalize_roster,
    normalize_teams, normalize_user_leagues, DraftPick, LeagueRecord, PlayerRecord, RosterSlot,
    TeamRecord,
};
use crate::text::decode_bytes;
use crate::{FantasyApiError, Result};
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Stats Yahoo leaves out of a season line unless asked for, games played and shutouts among them
const EXTRA_STAT_IDS: &str = "18,23,26,27,29,30,34";

/// Upstream error bodies are cut to this many characters
const MAX_ERROR_BODY_CHARS: usize = 500;

#[derive(Debug, Clone)]
pub struct FantasyClient {
    http: Client,
    base_url: String,
}

impl FantasyClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self { http, base_url: config.base_url.trim_end_matches('/').to_string() })
    }

    /// GET `{base_url}/{resource}?format=json` with the user's bearer token.
    ///
    /// A body that is not JSON is logged and returned as `Value::Null`.
    pub async fn get(&self, access_token: &str, resource: &str) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, resource);
        debug!(resource = %resource, "Yahoo API request");

        let response = self
            .http
            .get(&url)
            .query(&[("format", "json")])
            .bearer_auth(access_token)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = decode_bytes(&response.bytes().await?);

        if status == StatusCode::UNAUTHORIZED {
            warn!(resource = %resource, "Yahoo API rejected access token");
            return Err(FantasyApiError::Unauthorized { body: truncate(&body) });
        }
        if !status.is_success() {
            warn!(resource = %resource, status = status.as_u16(), "Yahoo API request failed");
            return Err(FantasyApiError::Upstream { status: status.as_u16(), body: truncate(&body) });
        }

        match serde_json::from_str(&body) {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!(resource = %resource, error = %e, "Unparsable Yahoo API response body");
                Ok(Value::Null)
            }
        }
    }

    /// Leagues across all of the user's games, optionally limited to one game code
    pub async fn user_leagues(
        &self,
        access_token: &str,
        game_code: Option<&str>,
    ) -> Result<Vec<LeagueRecord>> {
        let raw = self.get(access_token, "users;use_login=1/games/leagues").await?;
        Ok(normalize_user_leagues(&raw, game_code))
    }

    pub async fn league(&self, access_token: &str, league: &LeagueKey) -> Result<LeagueRecord> {
        let raw = self.get(access_token, &format!("league/{}", league)).await?;
        Ok(normalize_league(&raw))
    }

    pub async fn league_standings(
        &self,
        access_token: &str,
        league: &LeagueKey,
    ) -> Result<Vec<TeamRecord>> {
        let raw = self.get(access_token, &format!("league/{}/standings", league)).await?;
        Ok(normalize_teams(&raw))
    }

    pub async fn league_teams(&self, access_token: &str, league: &LeagueKey) -> Result<Vec<TeamRecord>> {
        let raw = self.get(access_token, &format!("league/{}/teams", league)).await?;
        Ok(normalize_teams(&raw))
    }

    pub async fn league_players(
        &self,
        access_token: &str,
        league: &LeagueKey,
        start: u32,
        count: u32,
    ) -> Result<Vec<PlayerRecord>> {
        let resource = format!("league/{}/players;start={};count={}", league, start, count);
        let raw = self.get(access_token, &resource).await?;
        Ok(normalize_players(&raw))
    }

    /// One page of players sorted by season fantasy points, with ownership,
    /// percent owned, draft analysis and season stats.
    pub async fn league_players_detailed(
        &self,
        access_token: &str,
        league: &LeagueKey,
        start: u32,
        count: u32,
    ) -> Result<Vec<PlayerRecord>> {
        let resource = format!(
            "leagues;league_keys={}/players;start={};count={};sort=PTS;sort_type=season;\
             out=ownership,info,starting_status,percent_started,percent_owned,draft_analysis/\
             stats;type=season;season={};extra_stat_ids={}",
            league,
            start,
            count,
            league.season(),
            EXTRA_STAT_IDS
        );
        let raw = self.get(access_token, &resource).await?;
        Ok(normalize_players(&raw))
    }

    pub async fn draft_results(&self, access_token: &str, league: &LeagueKey) -> Result<Vec<DraftPick>> {
        let raw = self.get(access_token, &format!("league/{}/draftresults", league)).await?;
        Ok(normalize_draft_results(&raw))
    }

    pub async fn team_roster(
        &self,
        access_token: &str,
        team: &TeamKey,
        week: Option<u32>,
    ) -> Result<Vec<RosterSlot>> {
        let resource = match week {
            Some(week) => format!("team/{}/roster;week={}", team, week),
            None => format!("team/{}/roster", team),
        };
        let raw = self.get(access_token, &resource).await?;
        Ok(normalize_roster(&raw))
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(MAX_ERROR_BODY_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> FantasyClient {
        FantasyClient::new(&ApiConfig {
            base_url: format!("{}/fantasy/v2", server.uri()),
            request_timeout_secs: 5,
        })
        .unwrap()
    }

    fn league() -> LeagueKey {
        "465.l.34948".parse().unwrap()
    }

    #[tokio::test]
    async fn test_requests_json_with_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fantasy/v2/league/465.l.34948"))
            .and(query_param("format", "json"))
            .and(header("authorization", "Bearer token-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "fantasy_content": { "league": [ { "league_key": "465.l.34948", "name": "Beer League", "season": "2025" } ] }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let record = client_for(&server).league("token-1", &league()).await.unwrap();
        assert_eq!(record.name.as_deref(), Some("Beer League"));
        assert_eq!(record.season, Some(2025));
    }

    #[tokio::test]
    async fn test_unauthorized_is_distinguished() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("token_expired"))
            .mount(&server)
            .await;

        let err = client_for(&server).league_teams("stale", &league()).await.unwrap_err();
        match err {
            FantasyApiError::Unauthorized { body } => assert_eq!(body, "token_expired"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_upstream_failure_carries_truncated_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("x".repeat(2000)))
            .mount(&server)
            .await;

        let err = client_for(&server).draft_results("token", &league()).await.unwrap_err();
        match err {
            FantasyApiError::Upstream { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body.len(), MAX_ERROR_BODY_CHARS);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unparsable_body_degrades_to_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<fantasy_content/>"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(client.league_standings("token", &league()).await.unwrap().is_empty());
        assert_eq!(client.league("token", &league()).await.unwrap(), LeagueRecord::default());
    }

    #[tokio::test]
    async fn test_latin1_body_is_decoded() {
        let server = MockServer::start().await;
        let mut body = br#"{"fantasy_content":{"league":[{"name":"St"#.to_vec();
        body.push(0xFC);
        body.extend_from_slice(br#"tzle Fans"}]}}"#);
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
            .mount(&server)
            .await;

        let record = client_for(&server).league("token", &league()).await.unwrap();
        assert_eq!(record.name.as_deref(), Some("Stützle Fans"));
    }

    #[tokio::test]
    async fn test_player_pages_and_roster_paths() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fantasy/v2/league/465.l.34948/players;start=25;count=10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "fantasy_content": { "league": [ {}, { "players": {
                    "0": { "player": [ [ { "player_key": "465.p.1" } ] ] },
                    "count": 1
                } } ] }
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/fantasy/v2/team/465.l.34948.t.3/roster;week=5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let players = client.league_players("token", &league(), 25, 10).await.unwrap();
        assert_eq!(players[0].player_key.as_deref(), Some("465.p.1"));

        let team: TeamKey = "465.l.34948.t.3".parse().unwrap();
        assert!(client.team_roster("token", &team, Some(5)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_detailed_players_request_season_stats() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(
                "/fantasy/v2/leagues;league_keys=465.l.34948/players;start=0;count=25;sort=PTS;sort_type=season;out=ownership,info,starting_status,percent_started,percent_owned,draft_analysis/stats;type=season;season=2025;extra_stat_ids=18,23,26,27,29,30,34",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "fantasy_content": { "leagues": { "0": { "league": [ {}, { "players": { "count": 0 } } ] }, "count": 1 } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let players = client_for(&server)
            .league_players_detailed("token", &league(), 0, 25)
            .await
            .unwrap();
        assert!(players.is_empty());
    }
}
