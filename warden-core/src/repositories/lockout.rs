use crate::{Error, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Repository for per-account failure counting and lock state.
///
/// Increment-and-read must be a single atomic operation at the store layer:
/// concurrent failed attempts may benignly over-count, but a read-then-write
/// race that under-counts could miss a lock, which is the failure mode to
/// avoid.
#[async_trait]
pub trait LockoutRepository: Send + Sync + 'static {
    /// Atomically increment the user's failure counter and return the new
    /// count. Returns `Ok(0)` for unknown users so callers cannot probe for
    /// account existence through this path.
    async fn increment_failed_attempts(&self, user_id: &UserId) -> Result<u32, Error>;

    /// Reset the failure counter to zero, leaving lock state untouched.
    /// Called on successful login.
    async fn reset_failed_attempts(&self, user_id: &UserId) -> Result<(), Error>;

    /// Mark the account locked. Returns `false` when no such user exists.
    async fn lock(&self, user_id: &UserId, locked_at: DateTime<Utc>) -> Result<bool, Error>;

    /// Clear the lock AND the failure counter in one statement, so no
    /// intermediate state (unlocked but still at-threshold) is observable.
    /// Returns `false` when no such user exists.
    async fn unlock(&self, user_id: &UserId) -> Result<bool, Error>;
}
