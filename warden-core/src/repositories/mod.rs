//! Repository traits for the data access layer
//!
//! Services talk to storage exclusively through these traits. A storage
//! backend implements each `*Repository` trait, the matching
//! `*RepositoryProvider` accessor traits, and finally [`RepositoryProvider`],
//! the supertrait the `warden` facade is generic over.

pub mod adapter;
pub mod ip_block;
pub mod lockout;
pub mod password;
pub mod session;
pub mod user;

pub use adapter::{
    IpBlockRepositoryAdapter, LockoutRepositoryAdapter, PasswordRepositoryAdapter,
    SessionRepositoryAdapter, UserRepositoryAdapter,
};
pub use ip_block::IpBlockRepository;
pub use lockout::LockoutRepository;
pub use password::PasswordRepository;
pub use session::SessionRepository;
pub use user::UserRepository;

use async_trait::async_trait;

use crate::Error;

/// Provider trait for user repository access.
pub trait UserRepositoryProvider: Send + Sync + 'static {
    /// The user repository implementation type
    type UserRepo: UserRepository;

    /// Get the user repository
    fn user(&self) -> &Self::UserRepo;
}

/// Provider trait for password repository access.
pub trait PasswordRepositoryProvider: Send + Sync + 'static {
    /// The password repository implementation type
    type PasswordRepo: PasswordRepository;

    /// Get the password repository
    fn password(&self) -> &Self::PasswordRepo;
}

/// Provider trait for session repository access.
pub trait SessionRepositoryProvider: Send + Sync + 'static {
    /// The session repository implementation type
    type SessionRepo: SessionRepository;

    /// Get the session repository
    fn session(&self) -> &Self::SessionRepo;
}

/// Provider trait for account-lockout repository access.
pub trait LockoutRepositoryProvider: Send + Sync + 'static {
    /// The lockout repository implementation type
    type LockoutRepo: LockoutRepository;

    /// Get the lockout repository
    fn lockout(&self) -> &Self::LockoutRepo;
}

/// Provider trait for blocked-IP repository access.
pub trait IpBlockRepositoryProvider: Send + Sync + 'static {
    /// The blocked-IP repository implementation type
    type IpBlockRepo: IpBlockRepository;

    /// Get the blocked-IP repository
    fn ip_block(&self) -> &Self::IpBlockRepo;
}

/// Supertrait combining all provider traits plus lifecycle methods.
///
/// Storage backends implement the individual repository traits, the accessor
/// traits above, and then this trait with `migrate()` and `health_check()`.
#[async_trait]
pub trait RepositoryProvider:
    UserRepositoryProvider
    + PasswordRepositoryProvider
    + SessionRepositoryProvider
    + LockoutRepositoryProvider
    + IpBlockRepositoryProvider
{
    /// Run migrations for all repositories
    async fn migrate(&self) -> Result<(), Error>;

    /// Health check for all repositories
    async fn health_check(&self) -> Result<(), Error>;
}
