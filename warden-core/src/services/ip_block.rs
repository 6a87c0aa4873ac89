//! Per-IP brute force defense.
//!
//! Failed login attempts are counted per source address in an ephemeral
//! fixed window; crossing the threshold writes a durable [`BlockedIp`] row
//! that every subsequent login attempt from that address trips over until it
//! expires or an admin lifts it.
//!
//! The counter is process-local and resets on restart; the block row is the
//! durable artifact. Expiry is re-checked on every read, so stale rows are
//! inert between sweeps.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use dashmap::DashMap;

use crate::{
    Error,
    config::IpBlockConfig,
    ip_block::{BlockedIp, NewBlockedIp},
    repositories::IpBlockRepository,
};

const BLOCK_REASON: &str = "Too many failed login attempts";

#[derive(Debug, Clone, Copy)]
struct AttemptWindow {
    count: u32,
    started: Instant,
}

/// Service coordinating the ephemeral failure counter and the durable block
/// rows for source addresses.
pub struct IpBlockService<R: IpBlockRepository> {
    repository: Arc<R>,
    config: IpBlockConfig,
    attempt_window: Duration,
    attempts: DashMap<String, AttemptWindow>,
}

impl<R: IpBlockRepository> IpBlockService<R> {
    pub fn new(repository: Arc<R>, config: IpBlockConfig) -> Self {
        let attempt_window = config
            .attempt_window
            .to_std()
            .unwrap_or(Duration::from_secs(15 * 60));
        Self {
            repository,
            config,
            attempt_window,
            attempts: DashMap::new(),
        }
    }

    /// The active block for an address, if any. A row whose `expires_at` has
    /// passed counts as absent; the next sweep removes it.
    pub async fn is_blocked(&self, ip_address: &str) -> Result<Option<BlockedIp>, Error> {
        let row = self.repository.find_by_ip(ip_address).await?;
        Ok(row.filter(|block| !block.is_expired(Utc::now())))
    }

    /// Count one failed attempt against an address. Returns `true` when this
    /// attempt triggered a block.
    pub async fn record_failed_attempt(&self, ip_address: &str) -> Result<bool, Error> {
        let now = Instant::now();
        let count = {
            let mut entry = self
                .attempts
                .entry(ip_address.to_string())
                .or_insert(AttemptWindow {
                    count: 0,
                    started: now,
                });

            if now.duration_since(entry.started) > self.attempt_window {
                entry.count = 1;
                entry.started = now;
            } else {
                entry.count += 1;
            }
            entry.count
        };

        if count < self.config.threshold {
            return Ok(false);
        }

        let blocked_at = Utc::now();
        let block = self
            .repository
            .upsert(NewBlockedIp {
                ip_address: ip_address.to_string(),
                reason: BLOCK_REASON.to_string(),
                failed_count: count,
                blocked_at,
                expires_at: blocked_at + self.config.block_duration,
            })
            .await?;

        // The row carries the count now; a fresh window starts after the
        // block lifts.
        self.attempts.remove(ip_address);

        tracing::warn!(
            ip_address = %block.ip_address,
            failed_count = block.failed_count,
            expires_at = %block.expires_at,
            "Blocked source address"
        );

        Ok(true)
    }

    /// Failed attempts left before the address blocks, floored at zero.
    pub fn remaining_attempts(&self, ip_address: &str) -> u32 {
        let count = self
            .attempts
            .get(ip_address)
            .filter(|w| w.started.elapsed() <= self.attempt_window)
            .map(|w| w.count)
            .unwrap_or(0);
        self.config.threshold.saturating_sub(count)
    }

    /// Forget the address's failure counter. Called on successful login.
    pub fn reset_attempts(&self, ip_address: &str) {
        self.attempts.remove(ip_address);
    }

    /// Lift a block by address. Returns `false` when none existed.
    pub async fn unblock(&self, ip_address: &str) -> Result<bool, Error> {
        self.attempts.remove(ip_address);
        self.repository.delete_by_ip(ip_address).await
    }

    /// Lift a block by row id. Returns `false` when none existed.
    pub async fn unblock_by_id(&self, id: i64) -> Result<bool, Error> {
        self.repository.delete_by_id(id).await
    }

    /// Remove rows whose block has lapsed.
    pub async fn clean_expired(&self) -> Result<u64, Error> {
        let removed = self.repository.delete_expired(Utc::now()).await?;
        if removed > 0 {
            tracing::info!(count = removed, "Removed expired IP blocks");
        }
        Ok(removed)
    }

    /// All currently blocked addresses for the admin listing. Expired rows
    /// are swept first, so the result only contains live blocks.
    pub async fn list_blocked(&self) -> Result<Vec<BlockedIp>, Error> {
        self.clean_expired().await?;
        self.repository.list_all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration as ChronoDuration, Utc};
    use std::sync::Mutex;

    /// Mock repository for testing
    struct MockIpBlockRepository {
        rows: Mutex<Vec<BlockedIp>>,
        next_id: Mutex<i64>,
    }

    impl MockIpBlockRepository {
        fn new() -> Self {
            Self {
                rows: Mutex::new(Vec::new()),
                next_id: Mutex::new(1),
            }
        }
    }

    #[async_trait]
    impl IpBlockRepository for MockIpBlockRepository {
        async fn upsert(&self, block: NewBlockedIp) -> Result<BlockedIp, Error> {
            let mut rows = self.rows.lock().unwrap();
            if let Some(existing) = rows.iter_mut().find(|r| r.ip_address == block.ip_address) {
                existing.reason = block.reason;
                existing.failed_count = block.failed_count;
                existing.blocked_at = block.blocked_at;
                existing.expires_at = block.expires_at;
                return Ok(existing.clone());
            }

            let mut next_id = self.next_id.lock().unwrap();
            let row = BlockedIp {
                id: *next_id,
                ip_address: block.ip_address,
                reason: block.reason,
                failed_count: block.failed_count,
                blocked_at: block.blocked_at,
                expires_at: block.expires_at,
            };
            *next_id += 1;
            rows.push(row.clone());
            Ok(row)
        }

        async fn find_by_ip(&self, ip_address: &str) -> Result<Option<BlockedIp>, Error> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.ip_address == ip_address)
                .cloned())
        }

        async fn delete_by_ip(&self, ip_address: &str) -> Result<bool, Error> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|r| r.ip_address != ip_address);
            Ok(rows.len() < before)
        }

        async fn delete_by_id(&self, id: i64) -> Result<bool, Error> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|r| r.id != id);
            Ok(rows.len() < before)
        }

        async fn delete_expired(&self, before: DateTime<Utc>) -> Result<u64, Error> {
            let mut rows = self.rows.lock().unwrap();
            let count = rows.len();
            rows.retain(|r| r.expires_at >= before);
            Ok((count - rows.len()) as u64)
        }

        async fn list_all(&self) -> Result<Vec<BlockedIp>, Error> {
            Ok(self.rows.lock().unwrap().clone())
        }
    }

    fn service(threshold: u32) -> IpBlockService<MockIpBlockRepository> {
        IpBlockService::new(
            Arc::new(MockIpBlockRepository::new()),
            IpBlockConfig::default().with_threshold(threshold),
        )
    }

    #[tokio::test]
    async fn test_block_triggers_at_threshold() {
        let service = service(5);

        for _ in 0..4 {
            assert!(!service.record_failed_attempt("10.0.0.5").await.unwrap());
            assert!(service.is_blocked("10.0.0.5").await.unwrap().is_none());
        }

        assert!(service.record_failed_attempt("10.0.0.5").await.unwrap());
        let block = service.is_blocked("10.0.0.5").await.unwrap().unwrap();
        assert_eq!(block.failed_count, 5);
        assert!(block.expires_at > block.blocked_at);
    }

    #[tokio::test]
    async fn test_remaining_attempts_counts_down() {
        let service = service(5);

        assert_eq!(service.remaining_attempts("10.0.0.5"), 5);
        service.record_failed_attempt("10.0.0.5").await.unwrap();
        service.record_failed_attempt("10.0.0.5").await.unwrap();
        assert_eq!(service.remaining_attempts("10.0.0.5"), 3);
    }

    #[tokio::test]
    async fn test_reset_clears_counter() {
        let service = service(5);

        for _ in 0..4 {
            service.record_failed_attempt("10.0.0.5").await.unwrap();
        }
        service.reset_attempts("10.0.0.5");
        assert_eq!(service.remaining_attempts("10.0.0.5"), 5);

        // After a reset the address gets a full fresh run.
        for _ in 0..4 {
            assert!(!service.record_failed_attempt("10.0.0.5").await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_addresses_are_independent() {
        let service = service(2);

        service.record_failed_attempt("10.0.0.5").await.unwrap();
        assert!(service.record_failed_attempt("10.0.0.5").await.unwrap());

        assert!(service.is_blocked("10.0.0.6").await.unwrap().is_none());
        assert_eq!(service.remaining_attempts("10.0.0.6"), 2);
    }

    #[tokio::test]
    async fn test_expired_block_reads_as_absent() {
        let repo = Arc::new(MockIpBlockRepository::new());
        let service = IpBlockService::new(repo.clone(), IpBlockConfig::default());

        let now = Utc::now();
        repo.upsert(NewBlockedIp {
            ip_address: "10.0.0.5".to_string(),
            reason: BLOCK_REASON.to_string(),
            failed_count: 5,
            blocked_at: now - ChronoDuration::minutes(30),
            expires_at: now - ChronoDuration::minutes(15),
        })
        .await
        .unwrap();

        assert!(service.is_blocked("10.0.0.5").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unblock_is_idempotent() {
        let service = service(1);

        service.record_failed_attempt("10.0.0.5").await.unwrap();
        assert!(service.unblock("10.0.0.5").await.unwrap());
        assert!(!service.unblock("10.0.0.5").await.unwrap());
        assert!(service.is_blocked("10.0.0.5").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unblock_by_id() {
        let service = service(1);

        service.record_failed_attempt("10.0.0.5").await.unwrap();
        let block = service.is_blocked("10.0.0.5").await.unwrap().unwrap();

        assert!(service.unblock_by_id(block.id).await.unwrap());
        assert!(!service.unblock_by_id(block.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_blocked_sweeps_expired_rows() {
        let repo = Arc::new(MockIpBlockRepository::new());
        let service = IpBlockService::new(repo.clone(), IpBlockConfig::default());

        let now = Utc::now();
        repo.upsert(NewBlockedIp {
            ip_address: "10.0.0.5".to_string(),
            reason: BLOCK_REASON.to_string(),
            failed_count: 5,
            blocked_at: now - ChronoDuration::hours(1),
            expires_at: now - ChronoDuration::minutes(45),
        })
        .await
        .unwrap();
        repo.upsert(NewBlockedIp {
            ip_address: "10.0.0.6".to_string(),
            reason: BLOCK_REASON.to_string(),
            failed_count: 5,
            blocked_at: now,
            expires_at: now + ChronoDuration::minutes(15),
        })
        .await
        .unwrap();

        let listed = service.list_blocked().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].ip_address, "10.0.0.6");
    }

    #[tokio::test]
    async fn test_counter_clears_when_block_created() {
        let service = service(2);

        service.record_failed_attempt("10.0.0.5").await.unwrap();
        assert!(service.record_failed_attempt("10.0.0.5").await.unwrap());

        // Counter restarted; the durable row is what blocks the address.
        assert_eq!(service.remaining_attempts("10.0.0.5"), 2);
        assert!(service.is_blocked("10.0.0.5").await.unwrap().is_some());
    }
}
