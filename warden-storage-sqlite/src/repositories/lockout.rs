//! SQLite implementation of the account-lockout repository.
//!
//! The failure counter is incremented and read back in one statement so
//! concurrent attempts can over-count but never miss the threshold.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use warden_core::{Error, UserId, error::StorageError, repositories::LockoutRepository};

pub struct SqliteLockoutRepository {
    pool: SqlitePool,
}

impl SqliteLockoutRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LockoutRepository for SqliteLockoutRepository {
    async fn increment_failed_attempts(&self, user_id: &UserId) -> Result<u32, Error> {
        let row: Option<(i64,)> = sqlx::query_as(
            r#"
            UPDATE users
            SET failed_attempts = failed_attempts + 1, updated_at = ?1
            WHERE id = ?2
            RETURNING failed_attempts
            "#,
        )
        .bind(Utc::now().timestamp())
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to increment failed attempts");
            StorageError::Database("Failed to increment failed attempts".to_string())
        })?;

        // Unknown users read as zero so this path cannot probe for existence.
        Ok(row.map(|(count,)| count as u32).unwrap_or(0))
    }

    async fn reset_failed_attempts(&self, user_id: &UserId) -> Result<(), Error> {
        sqlx::query("UPDATE users SET failed_attempts = 0, updated_at = ?1 WHERE id = ?2")
            .bind(Utc::now().timestamp())
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to reset failed attempts");
                StorageError::Database("Failed to reset failed attempts".to_string())
            })?;

        Ok(())
    }

    async fn lock(&self, user_id: &UserId, locked_at: DateTime<Utc>) -> Result<bool, Error> {
        let result = sqlx::query("UPDATE users SET locked_at = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(locked_at.timestamp())
            .bind(Utc::now().timestamp())
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to lock account");
                StorageError::Database("Failed to lock account".to_string())
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn unlock(&self, user_id: &UserId) -> Result<bool, Error> {
        // One statement clears both fields; no intermediate state is ever
        // visible to a concurrent reader.
        let result = sqlx::query(
            "UPDATE users SET locked_at = NULL, failed_attempts = 0, updated_at = ?1 WHERE id = ?2",
        )
        .bind(Utc::now().timestamp())
        .bind(user_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to unlock account");
            StorageError::Database("Failed to unlock account".to_string())
        })?;

        Ok(result.rows_affected() > 0)
    }
}
