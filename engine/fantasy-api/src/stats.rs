//! Hockey stat-id lookup table and per-player stat lines

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stat categories we name explicitly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stat {
    Goals,
    Assists,
    Points,
    PenaltyMinutes,
    ShotsOnGoal,
    Wins,
    GoalsAgainst,
    Saves,
    Shutouts,
    GamesPlayed,
    Hits,
    Blocks,
}

impl Stat {
    /// Resolve a Yahoo stat id or its abbreviation
    pub fn lookup(id: &str) -> Option<Self> {
        let stat = match id.trim() {
            "1" | "G" => Stat::Goals,
            "2" | "A" => Stat::Assists,
            "3" | "P" | "PTS" => Stat::Points,
            "5" | "PIM" => Stat::PenaltyMinutes,
            "14" | "SOG" | "SHT" => Stat::ShotsOnGoal,
            "19" | "W" => Stat::Wins,
            "22" | "GA" => Stat::GoalsAgainst,
            "25" | "SV" => Stat::Saves,
            "27" | "SO" => Stat::Shutouts,
            "29" | "GP" => Stat::GamesPlayed,
            "31" | "HIT" => Stat::Hits,
            "32" | "BLK" => Stat::Blocks,
            _ => return None,
        };
        Some(stat)
    }
}

/// Season (or week) stats for one player, keyed by name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatLine {
    pub games_played: Option<f64>,
    pub goals: Option<f64>,
    pub assists: Option<f64>,
    pub points: Option<f64>,
    pub penalty_minutes: Option<f64>,
    pub shots_on_goal: Option<f64>,
    pub hits: Option<f64>,
    pub blocks: Option<f64>,
    pub wins: Option<f64>,
    pub saves: Option<f64>,
    pub save_percentage: Option<f64>,
    pub goals_against: Option<f64>,
    pub shutouts: Option<f64>,
    /// Stats outside the table, as `stat_<id>`
    #[serde(default, flatten)]
    pub other: BTreeMap<String, f64>,
}

impl StatLine {
    /// Build a line from `(stat_id, value)` pairs and fill in the derived stats
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Option<f64>)>,
    {
        let mut line = StatLine::default();
        for (id, value) in pairs {
            line.set(id, value);
        }
        line.derive();
        line
    }

    pub fn set(&mut self, id: &str, value: Option<f64>) {
        let Some(stat) = Stat::lookup(id) else {
            if let Some(value) = value {
                self.other.insert(format!("stat_{}", id.trim()), value);
            }
            return;
        };

        let slot = match stat {
            Stat::Goals => &mut self.goals,
            Stat::Assists => &mut self.assists,
            Stat::Points => &mut self.points,
            Stat::PenaltyMinutes => &mut self.penalty_minutes,
            Stat::ShotsOnGoal => &mut self.shots_on_goal,
            Stat::Wins => &mut self.wins,
            Stat::GoalsAgainst => &mut self.goals_against,
            Stat::Saves => &mut self.saves,
            Stat::Shutouts => &mut self.shutouts,
            Stat::GamesPlayed => &mut self.games_played,
            Stat::Hits => &mut self.hits,
            Stat::Blocks => &mut self.blocks,
        };
        *slot = value;
    }

    /// Points are goals plus assists whenever either is known; save percentage
    /// needs both saves and goals against and a positive shot total.
    pub fn derive(&mut self) {
        if self.goals.is_some() || self.assists.is_some() {
            self.points = Some(self.goals.unwrap_or(0.0) + self.assists.unwrap_or(0.0));
        }

        if let (Some(saves), Some(ga)) = (self.saves, self.goals_against) {
            if saves + ga > 0.0 {
                self.save_percentage = Some(saves / (saves + ga));
            }
        }
    }

    /// True when any counting stat is present
    pub fn has_any(&self) -> bool {
        [
            self.goals,
            self.assists,
            self.points,
            self.penalty_minutes,
            self.shots_on_goal,
            self.hits,
            self.blocks,
            self.wins,
            self.saves,
            self.save_percentage,
            self.goals_against,
            self.shutouts,
        ]
        .iter()
        .any(|v| v.is_some_and(|v| v != 0.0))
    }
}
