//! Pending OAuth anti-forgery states

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::debug;

/// Longest time an issued state may stay redeemable
pub const MAX_STATE_TTL_SECS: u64 = 24 * 3600;

/// States handed out with an authorization URL and not yet redeemed.
///
/// Each state can be consumed exactly once, and only within `ttl` of being issued.
#[derive(Debug)]
pub struct PendingStates {
    ttl: Duration,
    issued: DashMap<String, DateTime<Utc>>,
}

impl PendingStates {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            ttl: Duration::seconds(ttl_secs.min(MAX_STATE_TTL_SECS) as i64),
            issued: DashMap::new(),
        }
    }

    /// Remember a freshly issued state
    pub fn issue(&self, state: &str) {
        self.issue_at(state, Utc::now());
    }

    pub fn issue_at(&self, state: &str, now: DateTime<Utc>) {
        self.prune(now);
        self.issued.insert(state.to_string(), now);
    }

    /// Redeem a state. Returns false for unknown, reused, or expired values.
    pub fn consume(&self, state: &str) -> bool {
        self.consume_at(state, Utc::now())
    }

    pub fn consume_at(&self, state: &str, now: DateTime<Utc>) -> bool {
        match self.issued.remove(state) {
            Some((_, issued_at)) => {
                let fresh = now - issued_at < self.ttl;
                if !fresh {
                    debug!("Rejected expired OAuth state");
                }
                fresh
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.issued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issued.is_empty()
    }

    fn prune(&self, now: DateTime<Utc>) {
        let ttl = self.ttl;
        self.issued.retain(|_, issued_at| now - *issued_at < ttl);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_state_is_single_use() {
        let states = PendingStates::new(600);
        states.issue_at("abc", at(0));

        assert!(states.consume_at("abc", at(1)));
        assert!(!states.consume_at("abc", at(2)));
    }

    #[test]
    fn test_unknown_state_is_rejected() {
        let states = PendingStates::new(600);
        states.issue_at("abc", at(0));

        assert!(!states.consume_at("xyz", at(1)));
        assert_eq!(states.len(), 1);
    }

    #[test]
    fn test_expired_state_is_rejected() {
        let states = PendingStates::new(600);
        states.issue_at("abc", at(0));

        assert!(!states.consume_at("abc", at(600)));
        assert!(states.is_empty());
    }

    #[test]
    fn test_issue_prunes_expired_states() {
        let states = PendingStates::new(60);
        states.issue_at("old", at(0));
        states.issue_at("new", at(120));

        assert_eq!(states.len(), 1);
        assert!(states.consume_at("new", at(121)));
    }

    #[test]
    fn test_huge_ttl_is_capped() {
        let states = PendingStates::new(u64::MAX);
        states.issue_at("abc", at(0));

        assert!(!states.consume_at("abc", at(MAX_STATE_TTL_SECS as i64)));
    }
}
