//! Flatten Yahoo fantasy JSON into plain records
//!
//! Yahoo's JSON is a mechanical translation of its XML: sibling elements become
//! arrays of single-key objects, repeated elements become objects keyed by
//! `"0"`, `"1"`, ... with a trailing `"count"`, and numbers arrive as strings.
//! Every lookup here is fallible and a missing piece of data becomes `None` or
//! an empty list; nothing in this module returns an error.

use crate::stats::StatLine;
use crate::text::repair_mojibake;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Look up `key` in an object, or in the first object reachable through nested
/// arrays. Objects are never descended into.
pub fn field<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(key),
        Value::Array(items) => items.iter().find_map(|item| field(item, key)),
        _ => None,
    }
}

/// Chain of [`field`] lookups
pub fn dig<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |node, key| field(node, key))
}

/// Members of a Yahoo collection: the numerically keyed values of an object in
/// index order, or the elements of an array.
pub fn collection(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => {
            let mut indexed: Vec<(usize, &Value)> = map
                .iter()
                .filter_map(|(k, v)| k.parse::<usize>().ok().map(|i| (i, v)))
                .collect();
            indexed.sort_by_key(|(i, _)| *i);
            indexed.into_iter().map(|(_, v)| v).collect()
        }
        _ => Vec::new(),
    }
}

/// Trimmed, repaired string; empty strings are `None`
pub fn text(value: Option<&Value>) -> Option<String> {
    let raw = match value? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if raw.is_empty() {
        None
    } else {
        Some(repair_mojibake(&raw))
    }
}

/// Numeric value; Yahoo uses `"-"` and `""` for "no value"
pub fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() || s == "-" {
                None
            } else {
                s.parse().ok()
            }
        }
        _ => None,
    }
}

pub fn integer(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse().ok().or_else(|| {
                s.parse::<f64>().ok().filter(|f| f.is_finite() && f.fract() == 0.0).map(|f| f as i64)
            })
        }
        _ => None,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeagueRecord {
    pub league_key: Option<String>,
    pub league_id: Option<String>,
    pub name: Option<String>,
    pub season: Option<i64>,
    pub game_code: Option<String>,
    pub num_teams: Option<i64>,
    pub current_week: Option<i64>,
    pub scoring_type: Option<String>,
    pub league_type: Option<String>,
    pub url: Option<String>,
}

impl LeagueRecord {
    /// Build from a league node (`[meta, {...}]`) or a bare metadata object
    pub fn from_node(node: &Value) -> Self {
        Self {
            league_key: text(field(node, "league_key")),
            league_id: text(field(node, "league_id")),
            name: text(field(node, "name")),
            season: integer(field(node, "season")),
            game_code: text(field(node, "game_code")),
            num_teams: integer(field(node, "num_teams")),
            current_week: integer(field(node, "current_week")),
            scoring_type: text(field(node, "scoring_type")),
            league_type: text(field(node, "league_type")),
            url: text(field(node, "url")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub team_key: Option<String>,
    pub team_id: Option<String>,
    pub name: Option<String>,
    pub manager: Option<String>,
    pub wins: Option<i64>,
    pub losses: Option<i64>,
    pub ties: Option<i64>,
    pub win_percentage: Option<f64>,
    pub points_for: Option<f64>,
    pub points_against: Option<f64>,
    pub rank: Option<i64>,
    pub playoff_seed: Option<i64>,
}

impl TeamRecord {
    pub fn from_node(team: &Value) -> Self {
        let standings = field(team, "team_standings");
        let outcome = standings.and_then(|s| field(s, "outcome_totals"));

        let manager = field(team, "managers").and_then(|managers| {
            collection(managers).into_iter().find_map(|entry| {
                let manager = field(entry, "manager").unwrap_or(entry);
                text(field(manager, "nickname"))
            })
        });

        let points_for = number(standings.and_then(|s| field(s, "points_for")))
            .or_else(|| number(dig(team, &["team_points", "total"])));

        Self {
            team_key: text(field(team, "team_key")),
            team_id: text(field(team, "team_id")),
            name: text(field(team, "name")),
            manager,
            wins: integer(outcome.and_then(|o| field(o, "wins"))),
            losses: integer(outcome.and_then(|o| field(o, "losses"))),
            ties: integer(outcome.and_then(|o| field(o, "ties"))),
            win_percentage: number(outcome.and_then(|o| field(o, "percentage"))),
            points_for,
            points_against: number(standings.and_then(|s| field(s, "points_against"))),
            rank: integer(standings.and_then(|s| field(s, "rank"))),
            playoff_seed: integer(standings.and_then(|s| field(s, "playoff_seed"))),
        }
    }
}

/// Which fantasy team currently holds a player
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ownership {
    pub ownership_type: Option<String>,
    pub owner_team_key: Option<String>,
    pub owner_team_name: Option<String>,
}

/// Yahoo's draft aggregates across all public leagues
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftAnalysis {
    pub average_pick: Option<f64>,
    pub average_round: Option<f64>,
    pub average_cost: Option<f64>,
    pub percent_drafted: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub player_key: Option<String>,
    pub player_id: Option<String>,
    pub name: Option<String>,
    pub position: Option<String>,
    pub team_abbr: Option<String>,
    pub status: Option<String>,
    pub fantasy_points: Option<f64>,
    pub percent_owned: Option<f64>,
    pub ownership: Option<Ownership>,
    pub draft_analysis: Option<DraftAnalysis>,
    pub stats: StatLine,
}

impl PlayerRecord {
    pub fn from_node(player: &Value) -> Self {
        let position = text(field(player, "display_position"))
            .or_else(|| text(field(player, "primary_position")))
            .or_else(|| text(field(player, "position_type")));

        let percent_owned = field(player, "percent_owned")
            .and_then(|po| number(field(po, "value")).or_else(|| number(Some(po))));

        let ownership = field(player, "ownership").map(|o| Ownership {
            ownership_type: text(field(o, "ownership_type")),
            owner_team_key: text(field(o, "owner_team_key")),
            owner_team_name: text(field(o, "owner_team_name")),
        });

        let draft_analysis = field(player, "draft_analysis").map(|d| DraftAnalysis {
            average_pick: number(field(d, "average_pick")),
            average_round: number(field(d, "average_round")),
            average_cost: number(field(d, "average_cost")),
            percent_drafted: number(field(d, "percent_drafted")),
        });

        let stat_nodes = dig(player, &["player_stats", "stats"]).map(collection).unwrap_or_default();
        let pairs: Vec<(String, Option<f64>)> = stat_nodes
            .into_iter()
            .filter_map(|node| {
                let stat = field(node, "stat").unwrap_or(node);
                let id = text(field(stat, "stat_id"))?;
                Some((id, number(field(stat, "value"))))
            })
            .collect();
        let stats = StatLine::from_pairs(pairs.iter().map(|(id, v)| (id.as_str(), *v)));

        Self {
            player_key: text(field(player, "player_key")),
            player_id: text(field(player, "player_id")),
            name: field(player, "name").and_then(|n| text(field(n, "full")).or_else(|| text(Some(n)))),
            position,
            team_abbr: text(field(player, "editorial_team_abbr")),
            status: text(field(player, "status")),
            fantasy_points: number(dig(player, &["player_points", "total"])),
            percent_owned,
            ownership,
            draft_analysis,
            stats,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftPick {
    pub pick: Option<i64>,
    pub round: Option<i64>,
    pub team_key: Option<String>,
    pub player_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RosterSlot {
    pub selected_position: Option<String>,
    pub player: PlayerRecord,
}

/// The league node of a `league/...` or `leagues;league_keys=...` response
fn league_node(raw: &Value) -> Option<&Value> {
    let content = field(raw, "fantasy_content")?;
    field(content, "league").or_else(|| {
        field(content, "leagues")
            .and_then(|leagues| collection(leagues).into_iter().find_map(|l| field(l, "league")))
    })
}

fn members<'a>(container: Option<&'a Value>, item: &str) -> Vec<&'a Value> {
    container
        .map(collection)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|entry| field(entry, item))
        .collect()
}

/// Leagues across every game the user plays, optionally restricted to one game code
pub fn normalize_user_leagues(raw: &Value, game_code: Option<&str>) -> Vec<LeagueRecord> {
    let users = dig(raw, &["fantasy_content", "users"]);

    let mut leagues = Vec::new();
    for user in members(users, "user") {
        for game in members(field(user, "games"), "game") {
            let code = text(field(game, "code"));
            let season = integer(field(game, "season"));

            for league in members(field(game, "leagues"), "league") {
                let mut record = LeagueRecord::from_node(league);
                if record.game_code.is_none() {
                    record.game_code = code.clone();
                }
                if record.season.is_none() {
                    record.season = season;
                }
                leagues.push(record);
            }
        }
    }

    match game_code {
        Some(wanted) => leagues
            .into_iter()
            .filter(|l| l.game_code.as_deref().is_some_and(|c| c.eq_ignore_ascii_case(wanted)))
            .collect(),
        None => leagues,
    }
}

pub fn normalize_league(raw: &Value) -> LeagueRecord {
    league_node(raw).map(LeagueRecord::from_node).unwrap_or_default()
}

/// Teams from either the `teams` or the `standings` sub-resource
pub fn normalize_teams(raw: &Value) -> Vec<TeamRecord> {
    let Some(league) = league_node(raw) else {
        return Vec::new();
    };
    let teams = field(league, "teams").or_else(|| dig(league, &["standings", "teams"]));

    members(teams, "team").into_iter().map(TeamRecord::from_node).collect()
}

pub fn normalize_players(raw: &Value) -> Vec<PlayerRecord> {
    let players = league_node(raw).and_then(|league| field(league, "players"));
    members(players, "player").into_iter().map(PlayerRecord::from_node).collect()
}

pub fn normalize_draft_results(raw: &Value) -> Vec<DraftPick> {
    let results = league_node(raw).and_then(|league| field(league, "draft_results"));

    members(results, "draft_result")
        .into_iter()
        .map(|pick| DraftPick {
            pick: integer(field(pick, "pick")),
            round: integer(field(pick, "round")),
            team_key: text(field(pick, "team_key")),
            player_key: text(field(pick, "player_key")),
        })
        .collect()
}

pub fn normalize_roster(raw: &Value) -> Vec<RosterSlot> {
    let roster = dig(raw, &["fantasy_content", "team", "roster"]);
    let players = roster.and_then(|r| {
        field(r, "players").or_else(|| collection(r).into_iter().find_map(|v| field(v, "players")))
    });

    members(players, "player")
        .into_iter()
        .map(|player| RosterSlot {
            selected_position: dig(player, &["selected_position", "position"])
                .and_then(|p| text(Some(p))),
            player: PlayerRecord::from_node(player),
        })
        .collect()
}
