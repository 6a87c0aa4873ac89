//! Temporarily banned source addresses
//!
//! A [`BlockedIp`] row exists while an address is serving out a block. At
//! most one row exists per address (writes upsert); expiry is re-checked on
//! every read, so a stale row is harmless until the next sweep removes it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A temporarily banned source address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockedIp {
    pub id: i64,

    pub ip_address: String,

    /// Human-readable reason shown in the admin listing.
    pub reason: String,

    /// Failed attempts recorded when the block was created or refreshed.
    pub failed_count: u32,

    pub blocked_at: DateTime<Utc>,

    pub expires_at: DateTime<Utc>,
}

impl BlockedIp {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Seconds until the block lifts, floored at zero. Computed for admin
    /// listings.
    pub fn seconds_remaining(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds().max(0)
    }
}

/// Payload for creating or refreshing a block row.
#[derive(Debug, Clone)]
pub struct NewBlockedIp {
    pub ip_address: String,
    pub reason: String,
    pub failed_count: u32,
    pub blocked_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn block(expires_in: Duration) -> BlockedIp {
        let now = Utc::now();
        BlockedIp {
            id: 1,
            ip_address: "10.0.0.5".to_string(),
            reason: "Too many failed login attempts".to_string(),
            failed_count: 5,
            blocked_at: now,
            expires_at: now + expires_in,
        }
    }

    #[test]
    fn test_expiry_is_checked_against_now() {
        let now = Utc::now();
        assert!(!block(Duration::minutes(15)).is_expired(now));
        assert!(block(Duration::seconds(-1)).is_expired(now));
    }

    #[test]
    fn test_seconds_remaining_floors_at_zero() {
        let now = Utc::now();
        let active = block(Duration::minutes(15));
        assert!(active.seconds_remaining(now) > 890);

        let expired = block(Duration::minutes(-5));
        assert_eq!(expired.seconds_remaining(now), 0);
    }
}
