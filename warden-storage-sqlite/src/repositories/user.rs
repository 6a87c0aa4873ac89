//! SQLite implementation of the user repository.

use async_trait::async_trait;
use chrono::DateTime;
use sqlx::SqlitePool;
use warden_core::{
    Error, User, UserId,
    error::StorageError,
    repositories::UserRepository,
    user::NewUser,
};

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Internal struct for query results
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct SqliteUser {
    id: String,
    username: String,
    role: String,
    failed_attempts: i64,
    locked_at: Option<i64>,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<SqliteUser> for User {
    type Error = Error;

    fn try_from(row: SqliteUser) -> Result<User, Error> {
        let role = row
            .role
            .parse()
            .map_err(|_| StorageError::Database(format!("Unknown role in users row: {}", row.role)))?;

        Ok(User {
            id: UserId::new(&row.id),
            username: row.username,
            role,
            failed_attempts: row.failed_attempts as u32,
            locked_at: row.locked_at.and_then(|ts| DateTime::from_timestamp(ts, 0)),
            created_at: DateTime::from_timestamp(row.created_at, 0)
                .ok_or_else(|| StorageError::Database("Invalid created_at timestamp".to_string()))?,
            updated_at: DateTime::from_timestamp(row.updated_at, 0)
                .ok_or_else(|| StorageError::Database("Invalid updated_at timestamp".to_string()))?,
        })
    }
}

const USER_COLUMNS: &str =
    "id, username, role, failed_attempts, locked_at, created_at, updated_at";

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, Error> {
        let row = sqlx::query_as::<_, SqliteUser>(&format!(
            r#"
            INSERT INTO users (id, username, role)
            VALUES (?, ?, ?)
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(user.id.as_str())
        .bind(&user.username)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                StorageError::Constraint("Username already taken".to_string())
            } else {
                tracing::error!(error = %e, "Failed to create user");
                StorageError::Database("Failed to create user".to_string())
            }
        })?;

        row.try_into()
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, Error> {
        let row = sqlx::query_as::<_, SqliteUser>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?",
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to find user by id");
            StorageError::Database("Failed to find user by id".to_string())
        })?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, Error> {
        let row = sqlx::query_as::<_, SqliteUser>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(username) = LOWER(?)",
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to find user by username");
            StorageError::Database("Failed to find user by username".to_string())
        })?;

        row.map(TryInto::try_into).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_support::setup_test_db;
    use warden_core::{error::StorageError, user::Role};

    #[tokio::test]
    async fn test_create_and_find_user() {
        let pool = setup_test_db().await;
        let repo = SqliteUserRepository::new(pool);

        let created = repo
            .create(NewUser::new("dispatch", Role::Agent))
            .await
            .expect("Failed to create user");
        assert_eq!(created.username, "dispatch");
        assert_eq!(created.role, Role::Agent);
        assert_eq!(created.failed_attempts, 0);
        assert!(created.locked_at.is_none());

        let found = repo.find_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(found.username, created.username);
    }

    #[tokio::test]
    async fn test_find_by_username_is_case_insensitive() {
        let pool = setup_test_db().await;
        let repo = SqliteUserRepository::new(pool);

        repo.create(NewUser::new("Bob", Role::Requester))
            .await
            .unwrap();

        assert!(repo.find_by_username("bob").await.unwrap().is_some());
        assert!(repo.find_by_username("BOB").await.unwrap().is_some());
        assert!(repo.find_by_username("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_hits_constraint() {
        let pool = setup_test_db().await;
        let repo = SqliteUserRepository::new(pool);

        repo.create(NewUser::new("bob", Role::Requester))
            .await
            .unwrap();

        // Case variation still collides with the lowered unique index.
        let result = repo.create(NewUser::new("BOB", Role::Requester)).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::Storage(StorageError::Constraint(_))
        ));
    }
}
