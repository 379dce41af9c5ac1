//! Admin session validity.
//!
//! The dashboard keeps an admin marker (a flag plus the epoch-millisecond
//! time it was issued) on the client. This module owns the rule for that
//! marker as plain data and pure functions, so the check can be applied
//! wherever the session is passed in rather than read from ambient storage.
//!
//! # Clock injection
//! Every check takes `now` instead of calling `Utc::now()`, which keeps the
//! 24-hour boundary deterministic in tests.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// How long an issued session stays valid, in milliseconds (24 hours).
pub const SESSION_TTL_MS: i64 = 24 * 60 * 60 * 1000;

pub fn session_ttl() -> TimeDelta {
    TimeDelta::milliseconds(SESSION_TTL_MS)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSession {
    pub active: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub issued_at: DateTime<Utc>,
}

impl AdminSession {
    /// A fresh, active session issued at `now`.
    pub fn issue(now: DateTime<Utc>) -> Self {
        AdminSession {
            active: true,
            issued_at: now,
        }
    }

    /// Rebuild a session from the stored flag (`"true"`) and issue time
    /// (epoch milliseconds). Returns `None` if either piece is missing or
    /// unreadable.
    pub fn from_stored(flag: Option<&str>, issued_ms: Option<&str>) -> Option<Self> {
        let active = flag? == "true";
        let millis: i64 = issued_ms?.trim().parse().ok()?;
        let issued_at = DateTime::from_timestamp_millis(millis)?;
        Some(AdminSession { active, issued_at })
    }
}

/// True while the session is active and younger than the session TTL.
///
/// Age is strictly less than the TTL: a session exactly 24 hours old has
/// expired.
pub fn is_valid(session: &AdminSession, now: DateTime<Utc>) -> bool {
    session.active && now - session.issued_at < session_ttl()
}

/// Keep the session if it is still valid, discard it otherwise.
pub fn check(session: Option<AdminSession>, now: DateTime<Utc>) -> Option<AdminSession> {
    session.filter(|s| is_valid(s, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn issued() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_fresh_session_is_valid() {
        let session = AdminSession::issue(issued());
        assert!(is_valid(&session, issued()));
        assert!(is_valid(&session, issued() + TimeDelta::hours(23)));
    }

    #[test]
    fn test_session_expires_at_exactly_24_hours() {
        let session = AdminSession::issue(issued());
        assert!(is_valid(&session, issued() + session_ttl() - TimeDelta::milliseconds(1)));
        assert!(!is_valid(&session, issued() + session_ttl()));
    }

    #[test]
    fn test_inactive_session_is_never_valid() {
        let session = AdminSession {
            active: false,
            issued_at: issued(),
        };
        assert!(!is_valid(&session, issued()));
    }

    #[test]
    fn test_check_discards_expired_session() {
        let session = AdminSession::issue(issued());
        assert_eq!(check(Some(session), issued() + TimeDelta::hours(1)), Some(session));
        assert_eq!(check(Some(session), issued() + TimeDelta::hours(25)), None);
        assert_eq!(check(None, issued()), None);
    }

    #[test]
    fn test_from_stored_parses_marker() {
        let millis = issued().timestamp_millis().to_string();
        let session = AdminSession::from_stored(Some("true"), Some(&millis)).unwrap();
        assert!(session.active);
        assert_eq!(session.issued_at, issued());

        assert!(AdminSession::from_stored(None, Some(&millis)).is_none());
        assert!(AdminSession::from_stored(Some("true"), None).is_none());
        assert!(AdminSession::from_stored(Some("true"), Some("yesterday")).is_none());
    }

    #[test]
    fn test_serializes_issue_time_as_epoch_millis() {
        let value = serde_json::to_value(AdminSession::issue(issued())).unwrap();
        assert_eq!(value["active"], true);
        assert_eq!(value["issuedAt"], issued().timestamp_millis());
    }
}
