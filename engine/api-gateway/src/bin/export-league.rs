//! # League export CLI
//!
//! Writes a league's player and standings spreadsheets using the tokens of a
//! user who has already logged in through the web app.

use account_service::{AccountServiceConfig, TokenManager, UserStore, YahooOAuthClient};
use anyhow::{bail, Result};
use api_gateway::export::{export_league, prompt_for_league, ExportPaths};
use api_gateway::logging::initialize_logging;
use clap::Parser;
use fantasy_api::{ApiConfig, FantasyClient, LeagueKey};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

/// Export a Yahoo fantasy league to CSV
#[derive(Parser)]
#[command(name = "export-league")]
#[command(about = "Export a Yahoo fantasy league's players and standings to CSV")]
struct Cli {
    /// League key such as 465.l.34948; lists your leagues when omitted
    league_key: Option<String>,

    /// Player spreadsheet path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Standings spreadsheet path
    #[arg(long)]
    standings_output: Option<PathBuf>,

    /// Stored user to export as (defaults to the first user who logged in)
    #[arg(long)]
    user: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());
    initialize_logging(&level.to_lowercase(), &format.to_lowercase())?;

    let cli = Cli::parse();

    let account_config = AccountServiceConfig::from_env()?;
    let store = UserStore::connect(&account_config.database).await?;
    let user = match cli.user.as_deref() {
        Some(user_id) => match store.get(user_id).await? {
            Some(user) => user,
            None => bail!("Unknown user {}. Stored users: {}", user_id, store.list_ids().await?.join(", ")),
        },
        None => match store.first().await? {
            Some(user) => user,
            None => bail!("No users found. Log in through the web app first."),
        },
    };

    let oauth = Arc::new(YahooOAuthClient::new(account_config.oauth)?);
    let tokens = TokenManager::new(store, oauth);
    let access_token = tokens.get_valid_access_token(&user.user_id).await?;

    let client = FantasyClient::new(&ApiConfig::from_env()?)?;

    let league: LeagueKey = match cli.league_key {
        Some(raw) => raw.parse()?,
        None => {
            let leagues = client.user_leagues(&access_token, None).await?;
            if leagues.is_empty() {
                bail!("No leagues found for user {}", user.user_id);
            }
            match prompt_for_league(&leagues, io::stdin().lock(), io::stdout())? {
                Some(league) => league,
                None => return Ok(()),
            }
        }
    };

    let paths = ExportPaths::for_league(&league, cli.output, cli.standings_output);
    let summary = export_league(&client, &access_token, &league, &paths).await?;

    println!(
        "Exported {} players ({} with stats) to {} and {} teams to {}",
        summary.players,
        summary.players_with_stats,
        paths.players.display(),
        summary.teams,
        paths.standings.display()
    );

    Ok(())
}
