//! Adapters from a [`RepositoryProvider`] to the individual repository traits.
//!
//! Services are generic over a single repository trait; these wrappers let
//! them be constructed from one shared provider.

use crate::{
    Error, Session, User, UserId,
    ip_block::{BlockedIp, NewBlockedIp},
    repositories::{
        IpBlockRepository, LockoutRepository, PasswordRepository, RepositoryProvider,
        SessionRepository, UserRepository,
    },
    session::SessionToken,
    user::NewUser,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub struct UserRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> UserRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> UserRepository for UserRepositoryAdapter<R> {
    async fn create(&self, user: NewUser) -> Result<User, Error> {
        self.provider.user().create(user).await
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, Error> {
        self.provider.user().find_by_id(id).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, Error> {
        self.provider.user().find_by_username(username).await
    }
}

pub struct PasswordRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> PasswordRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> PasswordRepository for PasswordRepositoryAdapter<R> {
    async fn set_password_hash(&self, user_id: &UserId, hash: &str) -> Result<(), Error> {
        self.provider.password().set_password_hash(user_id, hash).await
    }

    async fn get_password_hash(&self, user_id: &UserId) -> Result<Option<String>, Error> {
        self.provider.password().get_password_hash(user_id).await
    }
}

pub struct SessionRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> SessionRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> SessionRepository for SessionRepositoryAdapter<R> {
    async fn create(&self, session: Session) -> Result<Session, Error> {
        self.provider.session().create(session).await
    }

    async fn find_by_token(&self, token: &SessionToken) -> Result<Option<Session>, Error> {
        self.provider.session().find_by_token(token).await
    }

    async fn extend(
        &self,
        token: &SessionToken,
        updated_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), Error> {
        self.provider
            .session()
            .extend(token, updated_at, expires_at)
            .await
    }

    async fn delete(&self, token: &SessionToken) -> Result<(), Error> {
        self.provider.session().delete(token).await
    }

    async fn delete_by_user_id(&self, user_id: &UserId) -> Result<(), Error> {
        self.provider.session().delete_by_user_id(user_id).await
    }

    async fn delete_expired(&self, before: DateTime<Utc>) -> Result<u64, Error> {
        self.provider.session().delete_expired(before).await
    }
}

pub struct LockoutRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> LockoutRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> LockoutRepository for LockoutRepositoryAdapter<R> {
    async fn increment_failed_attempts(&self, user_id: &UserId) -> Result<u32, Error> {
        self.provider.lockout().increment_failed_attempts(user_id).await
    }

    async fn reset_failed_attempts(&self, user_id: &UserId) -> Result<(), Error> {
        self.provider.lockout().reset_failed_attempts(user_id).await
    }

    async fn lock(&self, user_id: &UserId, locked_at: DateTime<Utc>) -> Result<bool, Error> {
        self.provider.lockout().lock(user_id, locked_at).await
    }

    async fn unlock(&self, user_id: &UserId) -> Result<bool, Error> {
        self.provider.lockout().unlock(user_id).await
    }
}

pub struct IpBlockRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> IpBlockRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> IpBlockRepository for IpBlockRepositoryAdapter<R> {
    async fn upsert(&self, block: NewBlockedIp) -> Result<BlockedIp, Error> {
        self.provider.ip_block().upsert(block).await
    }

    async fn find_by_ip(&self, ip_address: &str) -> Result<Option<BlockedIp>, Error> {
        self.provider.ip_block().find_by_ip(ip_address).await
    }

    async fn delete_by_ip(&self, ip_address: &str) -> Result<bool, Error> {
        self.provider.ip_block().delete_by_ip(ip_address).await
    }

    async fn delete_by_id(&self, id: i64) -> Result<bool, Error> {
        self.provider.ip_block().delete_by_id(id).await
    }

    async fn delete_expired(&self, before: DateTime<Utc>) -> Result<u64, Error> {
        self.provider.ip_block().delete_expired(before).await
    }

    async fn list_all(&self) -> Result<Vec<BlockedIp>, Error> {
        self.provider.ip_block().list_all().await
    }
}
