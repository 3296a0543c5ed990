//! # League CSV export
//!
//! Pulls a league's players, draft and standings from Yahoo and writes two
//! spreadsheets: one row per player with ownership, draft and season stats,
//! and one row per team with its standing.

use anyhow::{Context, Result};
use fantasy_api::{DraftPick, FantasyClient, LeagueKey, LeagueRecord, PlayerRecord, TeamRecord};
use std::collections::HashMap;
use std::fs::File;
use std::future::Future;
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const PLAYERS_PAGE_SIZE: u32 = 25;
pub const MAX_PLAYER_PAGES: u32 = 60;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub const PLAYER_HEADERS: [&str; 26] = [
    "Player Name",
    "Position",
    "NHL Team",
    "Fantasy Points",
    "Current Team",
    "Current Owner",
    "Drafted Team",
    "Drafted By",
    "Draft Round",
    "Draft Pick",
    "ADP",
    "Pct Drafted",
    "Games Played",
    "Goals",
    "Assists",
    "Points",
    "PIM",
    "SOG",
    "Hits",
    "Blocks",
    "Wins",
    "Saves",
    "Save %",
    "GA",
    "Shutouts",
    "Pct Owned",
];

pub const STANDINGS_HEADERS: [&str; 10] = [
    "Rank",
    "Team Name",
    "Manager",
    "Wins",
    "Losses",
    "Ties",
    "Win %",
    "Points For",
    "Points Against",
    "Playoff Seed",
];

/// Where the two CSV files go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    pub players: PathBuf,
    pub standings: PathBuf,
}

impl ExportPaths {
    /// `<stem>_analysis.csv` and `<stem>_standings.csv` unless overridden
    pub fn for_league(league: &LeagueKey, players: Option<PathBuf>, standings: Option<PathBuf>) -> Self {
        let stem = league.file_stem();
        Self {
            players: players.unwrap_or_else(|| PathBuf::from(format!("{}_analysis.csv", stem))),
            standings: standings.unwrap_or_else(|| PathBuf::from(format!("{}_standings.csv", stem))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    pub players: usize,
    /// Players whose season line has at least one non-zero stat
    pub players_with_stats: usize,
    pub teams: usize,
    pub draft_picks: usize,
}

/// Lookup of fantasy teams by team key
pub struct TeamDirectory<'a> {
    teams: HashMap<&'a str, &'a TeamRecord>,
}

impl<'a> TeamDirectory<'a> {
    pub fn new(teams: &'a [TeamRecord]) -> Self {
        let teams = teams
            .iter()
            .filter_map(|team| team.team_key.as_deref().map(|key| (key, team)))
            .collect();
        Self { teams }
    }

    fn name(&self, team_key: Option<&str>) -> Option<String> {
        team_key.and_then(|key| self.teams.get(key)).and_then(|team| team.name.clone())
    }

    fn manager(&self, team_key: Option<&str>) -> Option<String> {
        team_key.and_then(|key| self.teams.get(key)).and_then(|team| team.manager.clone())
    }
}

/// Fetch pages of `PLAYERS_PAGE_SIZE` until one comes back empty or `MAX_PLAYER_PAGES` is reached
pub async fn collect_player_pages<F, Fut>(mut fetch_page: F) -> fantasy_api::Result<Vec<PlayerRecord>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = fantasy_api::Result<Vec<PlayerRecord>>>,
{
    let mut players = Vec::new();
    for page in 0..MAX_PLAYER_PAGES {
        let start = page * PLAYERS_PAGE_SIZE;
        let batch = fetch_page(start).await?;
        if batch.is_empty() {
            break;
        }
        debug!(start, fetched = batch.len(), "Fetched player page");
        players.extend(batch);
    }
    Ok(players)
}

fn cell_text(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}

fn cell_number(value: Option<f64>) -> String {
    match value {
        Some(v) if v.fract() == 0.0 && v.abs() < 1e15 => format!("{}", v as i64),
        Some(v) => v.to_string(),
        None => String::new(),
    }
}

fn cell_integer(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

pub fn player_row(
    player: &PlayerRecord,
    teams: &TeamDirectory<'_>,
    draft: &HashMap<&str, &DraftPick>,
) -> Vec<String> {
    let owner_key = player.ownership.as_ref().and_then(|o| o.owner_team_key.as_deref());
    let current_team = player
        .ownership
        .as_ref()
        .and_then(|o| o.owner_team_name.clone())
        .or_else(|| teams.name(owner_key));

    let pick = player.player_key.as_deref().and_then(|key| draft.get(key));
    let drafted_by_key = pick.and_then(|p| p.team_key.as_deref());
    let analysis = player.draft_analysis.as_ref();
    let stats = &player.stats;

    vec![
        cell_text(player.name.as_deref()),
        cell_text(player.position.as_deref()),
        cell_text(player.team_abbr.as_deref()),
        cell_number(player.fantasy_points),
        cell_text(current_team.as_deref()),
        cell_text(teams.manager(owner_key).as_deref()),
        cell_text(teams.name(drafted_by_key).as_deref()),
        cell_text(teams.manager(drafted_by_key).as_deref()),
        cell_integer(pick.and_then(|p| p.round)),
        cell_integer(pick.and_then(|p| p.pick)),
        cell_number(analysis.and_then(|a| a.average_pick)),
        cell_number(analysis.and_then(|a| a.percent_drafted)),
        cell_number(stats.games_played),
        cell_number(stats.goals),
        cell_number(stats.assists),
        cell_number(stats.points),
        cell_number(stats.penalty_minutes),
        cell_number(stats.shots_on_goal),
        cell_number(stats.hits),
        cell_number(stats.blocks),
        cell_number(stats.wins),
        cell_number(stats.saves),
        cell_number(stats.save_percentage),
        cell_number(stats.goals_against),
        cell_number(stats.shutouts),
        cell_number(player.percent_owned),
    ]
}

pub fn standings_row(team: &TeamRecord) -> Vec<String> {
    vec![
        cell_integer(team.rank),
        cell_text(team.name.as_deref()),
        cell_text(team.manager.as_deref()),
        cell_integer(team.wins),
        cell_integer(team.losses),
        cell_integer(team.ties),
        cell_number(team.win_percentage),
        cell_number(team.points_for),
        cell_number(team.points_against),
        cell_integer(team.playoff_seed),
    ]
}

/// Write a BOM-prefixed UTF-8 CSV so spreadsheet apps pick the right encoding
pub fn write_csv<W: Write>(mut writer: W, headers: &[&str], rows: &[Vec<String>]) -> Result<()> {
    writer.write_all(UTF8_BOM)?;

    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(headers)?;
    for row in rows {
        csv.write_record(row)?;
    }
    csv.flush()?;
    Ok(())
}

fn write_file(path: &Path, headers: &[&str], rows: &[Vec<String>]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write_csv(BufWriter::new(file), headers, rows).with_context(|| format!("writing {}", path.display()))
}

/// List `leagues` and read a choice from `input`.
///
/// Returns `None` when the user enters `q` or input ends.
pub fn prompt_for_league<R: BufRead, W: Write>(
    leagues: &[LeagueRecord],
    mut input: R,
    mut output: W,
) -> Result<Option<LeagueKey>> {
    writeln!(output, "Your leagues:")?;
    for (i, league) in leagues.iter().enumerate() {
        writeln!(
            output,
            "  {}. {} ({}) {}",
            i + 1,
            league.name.as_deref().unwrap_or("Unnamed league"),
            league.league_key.as_deref().unwrap_or("?"),
            league.season.map(|s| s.to_string()).unwrap_or_default()
        )?;
    }

    loop {
        write!(output, "Choose a league [1-{}] or q to quit: ", leagues.len())?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let choice = line.trim();
        if choice.eq_ignore_ascii_case("q") {
            return Ok(None);
        }

        let selected = choice
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| leagues.get(i))
            .and_then(|league| league.league_key.as_deref())
            .and_then(|key| key.parse::<LeagueKey>().ok());
        match selected {
            Some(key) => return Ok(Some(key)),
            None => writeln!(output, "Invalid choice: {}", choice)?,
        }
    }
}

/// Fetch everything for `league` and write both CSV files
pub async fn export_league(
    client: &FantasyClient,
    access_token: &str,
    league: &LeagueKey,
    paths: &ExportPaths,
) -> Result<ExportSummary> {
    info!(league = %league, game = league.game_code(), season = league.season(), "Exporting league");

    let draft = client.draft_results(access_token, league).await?;
    let teams = client.league_teams(access_token, league).await?;
    let players = collect_player_pages(|start| {
        client.league_players_detailed(access_token, league, start, PLAYERS_PAGE_SIZE)
    })
    .await?;
    let standings = client.league_standings(access_token, league).await?;

    let directory = TeamDirectory::new(&teams);
    let picks: HashMap<&str, &DraftPick> = draft
        .iter()
        .filter_map(|pick| pick.player_key.as_deref().map(|key| (key, pick)))
        .collect();

    let player_rows: Vec<Vec<String>> =
        players.iter().map(|player| player_row(player, &directory, &picks)).collect();
    write_file(&paths.players, &PLAYER_HEADERS, &player_rows)?;

    let standings_rows: Vec<Vec<String>> = standings.iter().map(standings_row).collect();
    write_file(&paths.standings, &STANDINGS_HEADERS, &standings_rows)?;

    let players_with_stats = players.iter().filter(|player| player.stats.has_any()).count();
    info!(
        players = players.len(),
        with_stats = players_with_stats,
        without_stats = players.len() - players_with_stats,
        teams = standings.len(),
        players_file = %paths.players.display(),
        standings_file = %paths.standings.display(),
        "League export written"
    );

    Ok(ExportSummary {
        players: players.len(),
        players_with_stats,
        teams: standings.len(),
        draft_picks: draft.len(),
    })
}
