// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Stored Google OAuth token (`google_tokens` collection).

use crate::time_utils::parse_utc_rfc3339;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A user's Google OAuth token. One document per user, keyed by user ID.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredToken {
    /// Google account subject (also used as document ID)
    pub user_id: String,
    /// Access token for Google APIs
    pub access_token: String,
    /// Refresh token; empty when Google never issued one
    #[serde(default)]
    pub refresh_token: String,
    /// When the access token expires (RFC 3339)
    pub expires_at: String,
    /// Space-separated scopes granted with this token
    #[serde(default)]
    pub scope: String,
    /// Last write (RFC 3339)
    pub updated_at: String,
}

impl StoredToken {
    /// Whether there is anything to send as a bearer token.
    pub fn has_access_token(&self) -> bool {
        !self.access_token.trim().is_empty()
    }

    pub fn has_refresh_token(&self) -> bool {
        !self.refresh_token.trim().is_empty()
    }

    /// Parsed expiry. `None` if the stored value is not valid RFC 3339.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        parse_utc_rfc3339(&self.expires_at)
    }

    /// An unparseable expiry counts as not expired; Google gets the final say.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|expires_at| now >= expires_at)
    }
}

impl fmt::Debug for StoredToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredToken")
            .field("user_id", &self.user_id)
            .field("access_token", &"<redacted>")
            .field("has_refresh_token", &self.has_refresh_token())
            .field("expires_at", &self.expires_at)
            .field("scope", &self.scope)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn token(access: &str, refresh: &str, expires_at: &str) -> StoredToken {
        StoredToken {
            user_id: "user-1".to_string(),
            access_token: access.to_string(),
            refresh_token: refresh.to_string(),
            expires_at: expires_at.to_string(),
            scope: String::new(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_empty_access_token_is_unusable() {
        assert!(!token("", "r", "2026-01-01T00:00:00Z").has_access_token());
        assert!(!token("   ", "r", "2026-01-01T00:00:00Z").has_access_token());
        assert!(token("ya29.a", "", "2026-01-01T00:00:00Z").has_access_token());
    }

    #[test]
    fn test_expiry() {
        let now = Utc::now();
        let past = (now - Duration::minutes(1)).to_rfc3339();
        let future = (now + Duration::minutes(30)).to_rfc3339();

        assert!(token("a", "", &past).is_expired_at(now));
        assert!(!token("a", "", &future).is_expired_at(now));
        assert!(!token("a", "", "garbage").is_expired_at(now));
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let t = token("ya29.secret", "1//refresh-secret", "2026-01-01T00:00:00Z");
        let debug = format!("{:?}", t);
        assert!(!debug.contains("ya29.secret"));
        assert!(!debug.contains("refresh-secret"));
        assert!(debug.contains("has_refresh_token: true"));
    }
}
