//! SQLite implementation of the blocked-IP repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use warden_core::{
    Error,
    error::StorageError,
    ip_block::{BlockedIp, NewBlockedIp},
    repositories::IpBlockRepository,
};

pub struct SqliteIpBlockRepository {
    pool: SqlitePool,
}

impl SqliteIpBlockRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Internal struct for query results
#[derive(Debug, Clone, sqlx::FromRow)]
struct SqliteBlockedIp {
    id: i64,
    ip_address: String,
    reason: String,
    failed_count: i64,
    blocked_at: i64,
    expires_at: i64,
}

impl TryFrom<SqliteBlockedIp> for BlockedIp {
    type Error = Error;

    fn try_from(row: SqliteBlockedIp) -> Result<BlockedIp, Error> {
        let timestamp = |ts: i64| {
            DateTime::from_timestamp(ts, 0)
                .ok_or_else(|| StorageError::Database("Invalid blocked_ips timestamp".to_string()))
        };

        Ok(BlockedIp {
            id: row.id,
            ip_address: row.ip_address,
            reason: row.reason,
            failed_count: row.failed_count as u32,
            blocked_at: timestamp(row.blocked_at)?,
            expires_at: timestamp(row.expires_at)?,
        })
    }
}

const BLOCK_COLUMNS: &str = "id, ip_address, reason, failed_count, blocked_at, expires_at";

#[async_trait]
impl IpBlockRepository for SqliteIpBlockRepository {
    async fn upsert(&self, block: NewBlockedIp) -> Result<BlockedIp, Error> {
        let row = sqlx::query_as::<_, SqliteBlockedIp>(&format!(
            r#"
            INSERT INTO blocked_ips (ip_address, reason, failed_count, blocked_at, expires_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(ip_address) DO UPDATE SET
                reason = excluded.reason,
                failed_count = excluded.failed_count,
                blocked_at = excluded.blocked_at,
                expires_at = excluded.expires_at
            RETURNING {BLOCK_COLUMNS}
            "#,
        ))
        .bind(&block.ip_address)
        .bind(&block.reason)
        .bind(block.failed_count as i64)
        .bind(block.blocked_at.timestamp())
        .bind(block.expires_at.timestamp())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to upsert blocked IP");
            StorageError::Database("Failed to upsert blocked IP".to_string())
        })?;

        row.try_into()
    }

    async fn find_by_ip(&self, ip_address: &str) -> Result<Option<BlockedIp>, Error> {
        let row = sqlx::query_as::<_, SqliteBlockedIp>(&format!(
            "SELECT {BLOCK_COLUMNS} FROM blocked_ips WHERE ip_address = ?1",
        ))
        .bind(ip_address)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to find blocked IP");
            StorageError::Database("Failed to find blocked IP".to_string())
        })?;

        row.map(TryInto::try_into).transpose()
    }

    async fn delete_by_ip(&self, ip_address: &str) -> Result<bool, Error> {
        let result = sqlx::query("DELETE FROM blocked_ips WHERE ip_address = ?1")
            .bind(ip_address)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to delete blocked IP");
                StorageError::Database("Failed to delete blocked IP".to_string())
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_id(&self, id: i64) -> Result<bool, Error> {
        let result = sqlx::query("DELETE FROM blocked_ips WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to delete blocked IP by id");
                StorageError::Database("Failed to delete blocked IP by id".to_string())
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_expired(&self, before: DateTime<Utc>) -> Result<u64, Error> {
        let result = sqlx::query("DELETE FROM blocked_ips WHERE expires_at < ?1")
            .bind(before.timestamp())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to delete expired blocks");
                StorageError::Database("Failed to delete expired blocks".to_string())
            })?;

        Ok(result.rows_affected())
    }

    async fn list_all(&self) -> Result<Vec<BlockedIp>, Error> {
        let rows = sqlx::query_as::<_, SqliteBlockedIp>(&format!(
            "SELECT {BLOCK_COLUMNS} FROM blocked_ips ORDER BY blocked_at DESC",
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to list blocked IPs");
            StorageError::Database("Failed to list blocked IPs".to_string())
        })?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_support::setup_test_db;
    use chrono::Duration;

    fn new_block(ip: &str, expires_in: Duration) -> NewBlockedIp {
        let now = Utc::now();
        NewBlockedIp {
            ip_address: ip.to_string(),
            reason: "Too many failed login attempts".to_string(),
            failed_count: 5,
            blocked_at: now,
            expires_at: now + expires_in,
        }
    }

    #[tokio::test]
    async fn test_upsert_keeps_one_row_per_address() {
        let pool = setup_test_db().await;
        let repo = SqliteIpBlockRepository::new(pool);

        let first = repo
            .upsert(new_block("10.0.0.5", Duration::minutes(15)))
            .await
            .unwrap();

        let mut refreshed = new_block("10.0.0.5", Duration::minutes(30));
        refreshed.failed_count = 8;
        let second = repo.upsert(refreshed).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.failed_count, 8);

        let listed = repo.list_all().await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_find_and_delete_by_ip() {
        let pool = setup_test_db().await;
        let repo = SqliteIpBlockRepository::new(pool);

        repo.upsert(new_block("10.0.0.5", Duration::minutes(15)))
            .await
            .unwrap();

        assert!(repo.find_by_ip("10.0.0.5").await.unwrap().is_some());
        assert!(repo.find_by_ip("10.0.0.6").await.unwrap().is_none());

        assert!(repo.delete_by_ip("10.0.0.5").await.unwrap());
        assert!(!repo.delete_by_ip("10.0.0.5").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_by_id() {
        let pool = setup_test_db().await;
        let repo = SqliteIpBlockRepository::new(pool);

        let block = repo
            .upsert(new_block("10.0.0.5", Duration::minutes(15)))
            .await
            .unwrap();

        assert!(repo.delete_by_id(block.id).await.unwrap());
        assert!(!repo.delete_by_id(block.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_expired_leaves_live_rows() {
        let pool = setup_test_db().await;
        let repo = SqliteIpBlockRepository::new(pool);

        repo.upsert(new_block("10.0.0.5", Duration::minutes(-5)))
            .await
            .unwrap();
        repo.upsert(new_block("10.0.0.6", Duration::minutes(15)))
            .await
            .unwrap();

        assert_eq!(repo.delete_expired(Utc::now()).await.unwrap(), 1);

        let listed = repo.list_all().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].ip_address, "10.0.0.6");
    }
}
