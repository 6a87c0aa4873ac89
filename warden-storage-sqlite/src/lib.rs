//! SQLite storage backend for the warden account-security engine.
//!
//! Provides [`SqliteRepositoryProvider`], which implements the
//! `warden_core::repositories::RepositoryProvider` trait on top of a
//! `sqlx::SqlitePool`, plus the migration set for the users, sessions, and
//! blocked_ips tables.

pub mod migrations;
pub mod repositories;

pub use repositories::{
    SqliteIpBlockRepository, SqliteLockoutRepository, SqlitePasswordRepository,
    SqliteRepositoryProvider, SqliteSessionRepository, SqliteUserRepository,
};
