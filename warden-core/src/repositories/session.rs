use crate::{Error, Session, UserId, session::SessionToken};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Repository for session data access.
#[async_trait]
pub trait SessionRepository: Send + Sync + 'static {
    /// Persist a new session row.
    async fn create(&self, session: Session) -> Result<Session, Error>;

    /// Find a session by token, expired or not. Callers check `expires_at`.
    async fn find_by_token(&self, token: &SessionToken) -> Result<Option<Session>, Error>;

    /// Slide a session forward. A no-op when the row is already gone.
    async fn extend(
        &self,
        token: &SessionToken,
        updated_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), Error>;

    /// Delete a session by token; succeeds when nothing existed.
    async fn delete(&self, token: &SessionToken) -> Result<(), Error>;

    /// Delete all sessions for a user.
    async fn delete_by_user_id(&self, user_id: &UserId) -> Result<(), Error>;

    /// Delete sessions with `expires_at` before the cutoff, returning the
    /// number of rows removed.
    async fn delete_expired(&self, before: DateTime<Utc>) -> Result<u64, Error>;
}
