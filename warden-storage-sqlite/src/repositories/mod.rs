//! Repository implementations for SQLite storage

pub mod ip_block;
pub mod lockout;
pub mod password;
pub mod session;
pub mod user;

pub use ip_block::SqliteIpBlockRepository;
pub use lockout::SqliteLockoutRepository;
pub use password::SqlitePasswordRepository;
pub use session::SqliteSessionRepository;
pub use user::SqliteUserRepository;

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::sync::Arc;
use warden_core::{
    Error,
    error::StorageError,
    repositories::{
        IpBlockRepositoryProvider, LockoutRepositoryProvider, PasswordRepositoryProvider,
        RepositoryProvider, SessionRepositoryProvider, UserRepositoryProvider,
    },
};

/// Repository provider implementation for SQLite
///
/// Implements all the individual repository provider traits as well as the
/// unified `RepositoryProvider` trait.
pub struct SqliteRepositoryProvider {
    pool: SqlitePool,
    user: Arc<SqliteUserRepository>,
    password: Arc<SqlitePasswordRepository>,
    session: Arc<SqliteSessionRepository>,
    lockout: Arc<SqliteLockoutRepository>,
    ip_block: Arc<SqliteIpBlockRepository>,
}

impl SqliteRepositoryProvider {
    pub fn new(pool: SqlitePool) -> Self {
        let user = Arc::new(SqliteUserRepository::new(pool.clone()));
        let password = Arc::new(SqlitePasswordRepository::new(pool.clone()));
        let session = Arc::new(SqliteSessionRepository::new(pool.clone()));
        let lockout = Arc::new(SqliteLockoutRepository::new(pool.clone()));
        let ip_block = Arc::new(SqliteIpBlockRepository::new(pool.clone()));

        Self {
            pool,
            user,
            password,
            session,
            lockout,
            ip_block,
        }
    }
}

// Implement individual provider traits

impl UserRepositoryProvider for SqliteRepositoryProvider {
    type UserRepo = SqliteUserRepository;

    fn user(&self) -> &Self::UserRepo {
        &self.user
    }
}

impl PasswordRepositoryProvider for SqliteRepositoryProvider {
    type PasswordRepo = SqlitePasswordRepository;

    fn password(&self) -> &Self::PasswordRepo {
        &self.password
    }
}

impl SessionRepositoryProvider for SqliteRepositoryProvider {
    type SessionRepo = SqliteSessionRepository;

    fn session(&self) -> &Self::SessionRepo {
        &self.session
    }
}

impl LockoutRepositoryProvider for SqliteRepositoryProvider {
    type LockoutRepo = SqliteLockoutRepository;

    fn lockout(&self) -> &Self::LockoutRepo {
        &self.lockout
    }
}

impl IpBlockRepositoryProvider for SqliteRepositoryProvider {
    type IpBlockRepo = SqliteIpBlockRepository;

    fn ip_block(&self) -> &Self::IpBlockRepo {
        &self.ip_block
    }
}

// Implement the unified RepositoryProvider trait

#[async_trait]
impl RepositoryProvider for SqliteRepositoryProvider {
    async fn migrate(&self) -> Result<(), Error> {
        use crate::migrations::{
            CreateBlockedIpsTable, CreateIndexes, CreateSessionsTable, CreateUsersTable,
            SqliteMigrationManager,
        };
        use warden_migration::{Migration, MigrationManager};

        let manager = SqliteMigrationManager::new(self.pool.clone());
        manager.initialize().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to initialize migrations");
            Error::Storage(StorageError::Migration(
                "Failed to initialize migrations".to_string(),
            ))
        })?;

        let migrations: Vec<Box<dyn Migration<_>>> = vec![
            Box::new(CreateUsersTable),
            Box::new(CreateSessionsTable),
            Box::new(CreateBlockedIpsTable),
            Box::new(CreateIndexes),
        ];
        manager.up(&migrations).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to run migrations");
            Error::Storage(StorageError::Migration(
                "Failed to run migrations".to_string(),
            ))
        })?;

        Ok(())
    }

    async fn health_check(&self) -> Result<(), Error> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub(crate) async fn setup_test_db() -> SqlitePool {
        // One connection: every pooled connection to `sqlite::memory:` opens
        // its own empty database.
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create pool");

        let provider = SqliteRepositoryProvider::new(pool.clone());
        provider.migrate().await.expect("Failed to run migrations");

        pool
    }
}
