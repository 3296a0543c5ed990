//! Yahoo Fantasy Sports data access
//!
//! A thin client over the fantasy v2 REST API plus the normalization layer that
//! flattens its nested, positionally-ambiguous JSON into plain records.

pub mod client;
pub mod config;
pub mod error;
pub mod keys;
pub mod normalize;
pub mod stats;
pub mod text;

pub use client::FantasyClient;
pub use config::ApiConfig;
pub use error::FantasyApiError;
pub use keys::{LeagueKey, PlayerKey, TeamKey};
pub use normalize::{
    DraftAnalysis, DraftPick, LeagueRecord, Ownership, PlayerRecord, RosterSlot, TeamRecord,
};
pub use stats::StatLine;

pub type Result<T> = std::result::Result<T, FantasyApiError>;
