//! SQLite implementation of the session repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use warden_core::{
    Error, Session, UserId, error::StorageError, repositories::SessionRepository,
    session::SessionToken,
};

pub struct SqliteSessionRepository {
    pool: SqlitePool,
}

impl SqliteSessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Internal struct for query results
#[derive(Debug, Clone, sqlx::FromRow)]
struct SqliteSession {
    token: String,
    user_id: String,
    created_at: i64,
    updated_at: i64,
    expires_at: i64,
}

impl TryFrom<SqliteSession> for Session {
    type Error = Error;

    fn try_from(row: SqliteSession) -> Result<Session, Error> {
        let timestamp = |ts: i64| {
            DateTime::from_timestamp(ts, 0)
                .ok_or_else(|| StorageError::Database("Invalid session timestamp".to_string()))
        };

        Ok(Session {
            token: SessionToken::new(&row.token),
            user_id: UserId::new(&row.user_id),
            created_at: timestamp(row.created_at)?,
            updated_at: timestamp(row.updated_at)?,
            expires_at: timestamp(row.expires_at)?,
        })
    }
}

#[async_trait]
impl SessionRepository for SqliteSessionRepository {
    async fn create(&self, session: Session) -> Result<Session, Error> {
        sqlx::query(
            r#"
            INSERT INTO sessions (token, user_id, created_at, updated_at, expires_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(session.token.as_str())
        .bind(session.user_id.as_str())
        .bind(session.created_at.timestamp())
        .bind(session.updated_at.timestamp())
        .bind(session.expires_at.timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to create session");
            StorageError::Database("Failed to create session".to_string())
        })?;

        Ok(session)
    }

    async fn find_by_token(&self, token: &SessionToken) -> Result<Option<Session>, Error> {
        let row = sqlx::query_as::<_, SqliteSession>(
            "SELECT token, user_id, created_at, updated_at, expires_at FROM sessions WHERE token = ?1",
        )
        .bind(token.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to find session");
            StorageError::Database("Failed to find session".to_string())
        })?;

        row.map(TryInto::try_into).transpose()
    }

    async fn extend(
        &self,
        token: &SessionToken,
        updated_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), Error> {
        sqlx::query("UPDATE sessions SET updated_at = ?1, expires_at = ?2 WHERE token = ?3")
            .bind(updated_at.timestamp())
            .bind(expires_at.timestamp())
            .bind(token.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to extend session");
                StorageError::Database("Failed to extend session".to_string())
            })?;

        Ok(())
    }

    async fn delete(&self, token: &SessionToken) -> Result<(), Error> {
        sqlx::query("DELETE FROM sessions WHERE token = ?1")
            .bind(token.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to delete session");
                StorageError::Database("Failed to delete session".to_string())
            })?;

        Ok(())
    }

    async fn delete_by_user_id(&self, user_id: &UserId) -> Result<(), Error> {
        sqlx::query("DELETE FROM sessions WHERE user_id = ?1")
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to delete user sessions");
                StorageError::Database("Failed to delete user sessions".to_string())
            })?;

        Ok(())
    }

    async fn delete_expired(&self, before: DateTime<Utc>) -> Result<u64, Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at < ?1")
            .bind(before.timestamp())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to delete expired sessions");
                StorageError::Database("Failed to delete expired sessions".to_string())
            })?;

        Ok(result.rows_affected())
    }
}
