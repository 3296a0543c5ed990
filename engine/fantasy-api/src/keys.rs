//! Composite Yahoo resource keys
//!
//! Yahoo addresses every resource with a dotted key built from the game id:
//! `{game_id}.l.{league_id}` for leagues, `{game_id}.l.{league_id}.t.{team_id}`
//! for teams and `{game_id}.p.{player_id}` for players.

use crate::FantasyApiError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Game code used when a game id is not in the lookup table
pub const DEFAULT_GAME_CODE: &str = "nhl";
/// Season used when a game id is not in the lookup table
pub const DEFAULT_SEASON: i32 = 2024;

const GAME_CODES: &[(&str, &str)] = &[
    ("449", "nfl"),
    ("461", "nfl"),
    ("465", "nhl"),
    ("427", "nhl"),
    ("404", "mlb"),
    ("412", "mlb"),
    ("428", "nba"),
];

const GAME_SEASONS: &[(&str, i32)] = &[
    ("331", 2014),
    ("346", 2015), ("348", 2015), ("352", 2015), ("353", 2015),
    ("357", 2016), ("359", 2016), ("363", 2016), ("364", 2016),
    ("370", 2017), ("371", 2017), ("375", 2017), ("376", 2017),
    ("378", 2018), ("380", 2018), ("383", 2018), ("385", 2018), ("386", 2018),
    ("388", 2019), ("390", 2019), ("391", 2019), ("395", 2019), ("396", 2019),
    ("398", 2020), ("399", 2020), ("402", 2020), ("403", 2020),
    ("404", 2021), ("406", 2021), ("410", 2021), ("411", 2021),
    ("412", 2022), ("414", 2022), ("418", 2022), ("419", 2022),
    ("422", 2023), ("423", 2023), ("427", 2023), ("428", 2023),
    ("431", 2024), ("449", 2024), ("453", 2024), ("454", 2024),
    ("458", 2025), ("461", 2025), ("465", 2025),
];

/// Sport code (`nfl`, `nhl`, `mlb`, `nba`) for a Yahoo game id
pub fn game_code_for(game_id: &str) -> &'static str {
    GAME_CODES
        .iter()
        .find(|(id, _)| *id == game_id)
        .map(|(_, code)| *code)
        .unwrap_or(DEFAULT_GAME_CODE)
}

/// Season year for a Yahoo game id
pub fn season_for(game_id: &str) -> i32 {
    GAME_SEASONS
        .iter()
        .find(|(id, _)| *id == game_id)
        .map(|(_, season)| *season)
        .unwrap_or(DEFAULT_SEASON)
}

fn valid_part(part: &str) -> bool {
    !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric())
}

fn invalid(key: &str) -> FantasyApiError {
    FantasyApiError::InvalidKey { key: key.to_string() }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LeagueKey {
    pub game_id: String,
    pub league_id: String,
}

impl LeagueKey {
    pub fn game_code(&self) -> &'static str {
        game_code_for(&self.game_id)
    }

    pub fn season(&self) -> i32 {
        season_for(&self.game_id)
    }

    /// The key with dots replaced, suitable for file names
    pub fn file_stem(&self) -> String {
        self.to_string().replace('.', "_")
    }
}

impl FromStr for LeagueKey {
    type Err = FantasyApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        match parts.as_slice() {
            [game_id, "l", league_id] if valid_part(game_id) && valid_part(league_id) => {
                Ok(Self { game_id: game_id.to_string(), league_id: league_id.to_string() })
            }
            _ => Err(invalid(s)),
        }
    }
}

impl fmt::Display for LeagueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.l.{}", self.game_id, self.league_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TeamKey {
    pub league: LeagueKey,
    pub team_id: String,
}

impl FromStr for TeamKey {
    type Err = FantasyApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        match parts.as_slice() {
            [game_id, "l", league_id, "t", team_id]
                if valid_part(game_id) && valid_part(league_id) && valid_part(team_id) =>
            {
                Ok(Self {
                    league: LeagueKey {
                        game_id: game_id.to_string(),
                        league_id: league_id.to_string(),
                    },
                    team_id: team_id.to_string(),
                })
            }
            _ => Err(invalid(s)),
        }
    }
}

impl fmt::Display for TeamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.t.{}", self.league, self.team_id)
    }
}

/// Player key. The league-scoped long form is accepted and reduced to `{game_id}.p.{player_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlayerKey {
    pub game_id: String,
    pub player_id: String,
}

impl FromStr for PlayerKey {
    type Err = FantasyApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        let (game_id, player_id) = match parts.as_slice() {
            [game_id, "p", player_id] => (*game_id, *player_id),
            [game_id, "l", league_id, "p", player_id] if valid_part(league_id) => {
                (*game_id, *player_id)
            }
            _ => return Err(invalid(s)),
        };

        if !valid_part(game_id) || !valid_part(player_id) {
            return Err(invalid(s));
        }
        Ok(Self { game_id: game_id.to_string(), player_id: player_id.to_string() })
    }
}

impl fmt::Display for PlayerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.p.{}", self.game_id, self.player_id)
    }
}

macro_rules! string_conversions {
    ($($ty:ty),*) => {$(
        impl TryFrom<String> for $ty {
            type Error = FantasyApiError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$ty> for String {
            fn from(key: $ty) -> Self {
                key.to_string()
            }
        }
    )*};
}

string_conversions!(LeagueKey, TeamKey, PlayerKey);
