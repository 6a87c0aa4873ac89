use crate::{Error, ip_block::BlockedIp, ip_block::NewBlockedIp};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Repository for blocked-IP rows.
#[async_trait]
pub trait IpBlockRepository: Send + Sync + 'static {
    /// Create a block row, or refresh the existing row for the same address
    /// (there is at most one row per address).
    async fn upsert(&self, block: NewBlockedIp) -> Result<BlockedIp, Error>;

    /// Find the block row for an address, expired or not. Callers check
    /// `expires_at`.
    async fn find_by_ip(&self, ip_address: &str) -> Result<Option<BlockedIp>, Error>;

    /// Delete by address. Returns `false` when no row existed.
    async fn delete_by_ip(&self, ip_address: &str) -> Result<bool, Error>;

    /// Delete by row id. Returns `false` when no row existed.
    async fn delete_by_id(&self, id: i64) -> Result<bool, Error>;

    /// Delete rows with `expires_at` before the cutoff, returning the number
    /// of rows removed.
    async fn delete_expired(&self, before: DateTime<Utc>) -> Result<u64, Error>;

    /// All block rows, newest first.
    async fn list_all(&self) -> Result<Vec<BlockedIp>, Error>;
}
