//! League analyzers
//!
//! The analysis models are not built yet. Each analyzer exposes its named
//! capabilities, and every one of them answers `NotImplemented` so that callers
//! never mistake an empty report for a real result.

use crate::error::{GatewayError, GatewayResult};
use fantasy_api::{DraftPick, LeagueKey, PlayerKey, PlayerRecord};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
pub struct DraftReport {
    pub total_picks: usize,
    pub best_picks: Vec<DraftPick>,
    pub worst_picks: Vec<DraftPick>,
    pub draft_grades: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TradeReport {
    pub overperformers: Vec<PlayerRecord>,
    pub underperformers: Vec<PlayerRecord>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceReport {
    pub player_key: String,
    pub projected_points: f64,
    pub actual_points: f64,
    pub differential: f64,
    pub percentage_diff: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeasonHistory {
    pub season: i64,
    pub league_key: String,
}

fn not_implemented<T>(capability: &'static str) -> GatewayResult<T> {
    Err(GatewayError::NotImplemented { capability })
}

/// Grades a league's draft against how the picks actually played
#[derive(Debug, Default, Clone, Copy)]
pub struct DraftAnalyzer;

impl DraftAnalyzer {
    pub const CAPABILITIES: &'static [&'static str] = &["draft_grades"];

    pub fn analyze_draft(&self, _league: &LeagueKey) -> GatewayResult<DraftReport> {
        not_implemented("draft_grades")
    }
}

/// Finds over- and under-performers worth trading for or away
#[derive(Debug, Default, Clone, Copy)]
pub struct TradeAnalyzer;

impl TradeAnalyzer {
    pub const CAPABILITIES: &'static [&'static str] = &["trade_targets"];

    pub fn analyze_trades(&self, _league: &LeagueKey) -> GatewayResult<TradeReport> {
        not_implemented("trade_targets")
    }
}

/// Projection-versus-actual trends for players and league history
#[derive(Debug, Default, Clone, Copy)]
pub struct PerformanceAnalyzer;

impl PerformanceAnalyzer {
    pub const CAPABILITIES: &'static [&'static str] = &["performance_trend", "league_history"];

    pub fn player_trend(&self, _player: &PlayerKey, _league: &LeagueKey) -> GatewayResult<PerformanceReport> {
        not_implemented("performance_trend")
    }

    pub fn league_history(&self, _league: &LeagueKey, _seasons: Option<u32>) -> GatewayResult<Vec<SeasonHistory>> {
        not_implemented("league_history")
    }
}
