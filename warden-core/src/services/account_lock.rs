//! Per-account lockout.
//!
//! Unlike IP blocks, account locks do not expire: once an account crosses
//! the failure threshold it stays locked until an admin unlocks it, and a
//! locked account cannot authenticate regardless of password correctness.

use std::sync::Arc;

use chrono::Utc;

use crate::{Error, UserId, config::LockoutConfig, repositories::LockoutRepository};

/// Outcome of recording a failed attempt against an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutStatus {
    /// Whether the account is locked after this attempt.
    pub locked: bool,
    /// Failed attempts left before the account locks, floored at zero.
    pub remaining_attempts: u32,
}

/// Service for per-account failure counting and lock state.
pub struct AccountLockService<R: LockoutRepository> {
    repository: Arc<R>,
    config: LockoutConfig,
}

impl<R: LockoutRepository> AccountLockService<R> {
    pub fn new(repository: Arc<R>, config: LockoutConfig) -> Self {
        Self { repository, config }
    }

    /// Count one failed attempt. The increment is atomic at the store layer;
    /// crossing the threshold locks the account before this returns.
    pub async fn record_failed_attempt(&self, user_id: &UserId) -> Result<LockoutStatus, Error> {
        let count = self.repository.increment_failed_attempts(user_id).await?;

        if count >= self.config.threshold {
            self.repository.lock(user_id, Utc::now()).await?;
            tracing::warn!(
                user_id = %user_id,
                failed_attempts = count,
                "Locked account after repeated failed logins"
            );
            return Ok(LockoutStatus {
                locked: true,
                remaining_attempts: 0,
            });
        }

        Ok(LockoutStatus {
            locked: false,
            remaining_attempts: self.config.threshold - count,
        })
    }

    /// Zero the failure counter. Called on successful login; lock state is
    /// untouched.
    pub async fn reset_attempts(&self, user_id: &UserId) -> Result<(), Error> {
        self.repository.reset_failed_attempts(user_id).await
    }

    /// Admin override: lock without a threshold breach. Returns `false` when
    /// no such user exists.
    pub async fn lock(&self, user_id: &UserId) -> Result<bool, Error> {
        self.repository.lock(user_id, Utc::now()).await
    }

    /// Admin unlock. Clears the lock and the counter in one store operation;
    /// returns `false` when no such user exists.
    pub async fn unlock(&self, user_id: &UserId) -> Result<bool, Error> {
        self.repository.unlock(user_id).await
    }
}
