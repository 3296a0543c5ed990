//! User token record

use crate::oauth::TokenGrant;
use crate::DEFAULT_EXPIRES_IN_SECS;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A Yahoo user and the token pair currently held for them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// External (Yahoo) account identifier
    pub user_id: String,
    pub access_token: String,
    pub refresh_token: String,
    /// Whole-second instant after which `access_token` must not be used
    pub token_expires_at: DateTime<Utc>,
}

impl User {
    /// Build a record from a freshly exchanged grant
    pub fn from_grant(user_id: &str, refresh_token: String, grant: &TokenGrant, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            access_token: grant.access_token.clone(),
            refresh_token,
            token_expires_at: expiry_from(now, grant.expires_in),
        }
    }

    /// Whether the access token may still be used at `now`
    pub fn is_access_token_valid(&self, now: DateTime<Utc>) -> bool {
        now < self.token_expires_at
    }

    /// Apply a refresh grant. The prior refresh token is kept when the grant omits one.
    pub fn apply_refresh(&mut self, grant: &TokenGrant, now: DateTime<Utc>) {
        self.access_token = grant.access_token.clone();
        if let Some(refresh_token) = grant.refresh_token.as_ref().filter(|t| !t.is_empty()) {
            self.refresh_token = refresh_token.clone();
        }
        self.token_expires_at = expiry_from(now, grant.expires_in);
    }
}

/// Longest access-token lifetime accepted from the token endpoint
pub const MAX_EXPIRES_IN_SECS: i64 = 365 * 24 * 3600;

/// `now + expires_in`, truncated to whole seconds so it survives storage unchanged.
///
/// `expires_in` is clamped to `0..=MAX_EXPIRES_IN_SECS`.
pub fn expiry_from(now: DateTime<Utc>, expires_in: Option<i64>) -> DateTime<Utc> {
    let secs = expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS).clamp(0, MAX_EXPIRES_IN_SECS);
    let expiry = Duration::try_seconds(secs)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .unwrap_or(now);
    Utc.timestamp_opt(expiry.timestamp(), 0).single().unwrap_or(expiry)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grant(access: &str, refresh: Option<&str>, expires_in: Option<i64>) -> TokenGrant {
        TokenGrant {
            access_token: access.to_string(),
            refresh_token: refresh.map(str::to_string),
            expires_in,
            token_type: Some("bearer".to_string()),
            xoauth_yahoo_guid: None,
        }
    }

    #[test]
    fn test_expiry_is_whole_seconds() {
        let now = Utc.timestamp_opt(1_700_000_000, 987_654_321).unwrap();
        let expiry = expiry_from(now, Some(3600));
        assert_eq!(expiry.timestamp(), 1_700_003_600);
        assert_eq!(expiry.timestamp_subsec_nanos(), 0);
    }

    #[test]
    fn test_missing_expires_in_defaults_to_an_hour() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        assert_eq!(expiry_from(now, None).timestamp(), 1_700_003_600);
    }

    #[test]
    fn test_out_of_range_expires_in_is_clamped() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

        assert_eq!(expiry_from(now, Some(100_000_000_000_000)).timestamp(), 1_700_000_000 + MAX_EXPIRES_IN_SECS);
        assert_eq!(expiry_from(now, Some(i64::MAX)).timestamp(), 1_700_000_000 + MAX_EXPIRES_IN_SECS);
        assert_eq!(expiry_from(now, Some(-30)), now);
    }

    #[test]
    fn test_validity_is_strictly_before_expiry() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let user = User::from_grant("GUID", "r1".to_string(), &grant("a1", Some("r1"), Some(60)), now);

        assert!(user.is_access_token_valid(now));
        assert!(user.is_access_token_valid(now + Duration::seconds(59)));
        assert!(!user.is_access_token_valid(now + Duration::seconds(60)));
    }

    #[test]
    fn test_refresh_without_new_refresh_token_keeps_previous() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let mut user = User::from_grant("GUID", "r1".to_string(), &grant("a1", Some("r1"), Some(60)), now);

        let later = now + Duration::seconds(120);
        user.apply_refresh(&grant("a2", None, Some(3600)), later);

        assert_eq!(user.access_token, "a2");
        assert_eq!(user.refresh_token, "r1");
        assert_eq!(user.token_expires_at.timestamp(), later.timestamp() + 3600);
    }

    #[test]
    fn test_refresh_with_new_refresh_token_replaces_it() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let mut user = User::from_grant("GUID", "r1".to_string(), &grant("a1", Some("r1"), Some(60)), now);

        user.apply_refresh(&grant("a2", Some("r2"), Some(3600)), now);
        assert_eq!(user.refresh_token, "r2");
    }
}
