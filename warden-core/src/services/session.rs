//! Sliding-window session management.
//!
//! Every successful validation recomputes the session's expiry to
//! `now + slide_window`, so a session lives indefinitely under continuous
//! activity and dies exactly one window after the last validated request.
//!
//! The durable store is authoritative: validation always reads and slides
//! the row there, then refreshes the process-local cache. The cache exists
//! only for advisory, non-sliding reads by in-process consumers.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use crate::{
    Error, Session, UserId, config::SessionConfig, repositories::SessionRepository,
    session::SessionToken,
};

#[derive(Debug, Clone)]
struct CachedSession {
    user_id: UserId,
    expires_at: DateTime<Utc>,
}

/// Service for issuing, validating, and revoking sessions.
pub struct SessionService<R: SessionRepository> {
    repository: Arc<R>,
    slide_window: Duration,
    cache: DashMap<String, CachedSession>,
}

impl<R: SessionRepository> SessionService<R> {
    pub fn new(repository: Arc<R>, config: &SessionConfig) -> Self {
        Self {
            repository,
            slide_window: config.slide_window,
            cache: DashMap::new(),
        }
    }

    /// Issue a new session for a user.
    pub async fn create(&self, user_id: &UserId) -> Result<Session, Error> {
        let now = Utc::now();
        let session = Session {
            token: SessionToken::new_random(),
            user_id: user_id.clone(),
            created_at: now,
            updated_at: now,
            expires_at: now + self.slide_window,
        };

        let session = self.repository.create(session).await?;
        self.cache_session(&session);
        Ok(session)
    }

    /// Validate a token and slide its expiry.
    ///
    /// Always consults the durable store so the slide is authoritative.
    /// Returns `None` for absent and expired sessions alike; expired rows are
    /// left for the sweep.
    pub async fn validate(&self, token: &SessionToken) -> Result<Option<Session>, Error> {
        let Some(mut session) = self.repository.find_by_token(token).await? else {
            self.cache.remove(token.as_str());
            return Ok(None);
        };

        let now = Utc::now();
        if session.expires_at <= now {
            self.cache.remove(token.as_str());
            return Ok(None);
        }

        session.updated_at = now;
        session.expires_at = now + self.slide_window;
        self.repository
            .extend(token, session.updated_at, session.expires_at)
            .await?;
        self.cache_session(&session);

        Ok(Some(session))
    }

    /// Advisory cache read: the owning user of a live session, without
    /// touching the durable store and without sliding. Never authoritative.
    pub fn cached_user_id(&self, token: &SessionToken) -> Option<UserId> {
        let entry = self.cache.get(token.as_str())?;
        if entry.expires_at <= Utc::now() {
            drop(entry);
            self.cache.remove(token.as_str());
            return None;
        }
        Some(entry.user_id.clone())
    }

    /// Destroy a session. Idempotent: destroying an absent session succeeds.
    pub async fn destroy(&self, token: &SessionToken) -> Result<(), Error> {
        self.repository.delete(token).await?;
        self.cache.remove(token.as_str());
        Ok(())
    }

    /// Destroy every session belonging to a user (admin lock path).
    pub async fn destroy_for_user(&self, user_id: &UserId) -> Result<(), Error> {
        self.repository.delete_by_user_id(user_id).await?;
        self.cache.retain(|_, cached| &cached.user_id != user_id);
        Ok(())
    }

    /// Remove expired rows from the store and the cache. Expiry is already
    /// enforced on read; this bounds storage growth.
    pub async fn sweep_expired(&self) -> Result<u64, Error> {
        let now = Utc::now();
        let removed = self.repository.delete_expired(now).await?;
        self.cache.retain(|_, cached| cached.expires_at > now);
        if removed > 0 {
            tracing::info!(count = removed, "Removed expired sessions");
        }
        Ok(removed)
    }

    fn cache_session(&self, session: &Session) {
        self.cache.insert(
            session.token.as_str().to_string(),
            CachedSession {
                user_id: session.user_id.clone(),
                expires_at: session.expires_at,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Mock repository for testing
    #[derive(Default)]
    struct MockSessionRepository {
        sessions: Mutex<HashMap<String, Session>>,
    }

    #[async_trait]
    impl SessionRepository for MockSessionRepository {
        async fn create(&self, session: Session) -> Result<Session, Error> {
            self.sessions
                .lock()
                .unwrap()
                .insert(session.token.as_str().to_string(), session.clone());
            Ok(session)
        }

        async fn find_by_token(&self, token: &SessionToken) -> Result<Option<Session>, Error> {
            Ok(self.sessions.lock().unwrap().get(token.as_str()).cloned())
        }

        async fn extend(
            &self,
            token: &SessionToken,
            updated_at: DateTime<Utc>,
            expires_at: DateTime<Utc>,
        ) -> Result<(), Error> {
            if let Some(session) = self.sessions.lock().unwrap().get_mut(token.as_str()) {
                session.updated_at = updated_at;
                session.expires_at = expires_at;
            }
            Ok(())
        }

        async fn delete(&self, token: &SessionToken) -> Result<(), Error> {
            self.sessions.lock().unwrap().remove(token.as_str());
            Ok(())
        }

        async fn delete_by_user_id(&self, user_id: &UserId) -> Result<(), Error> {
            self.sessions
                .lock()
                .unwrap()
                .retain(|_, s| &s.user_id != user_id);
            Ok(())
        }

        async fn delete_expired(&self, before: DateTime<Utc>) -> Result<u64, Error> {
            let mut sessions = self.sessions.lock().unwrap();
            let count = sessions.len();
            sessions.retain(|_, s| s.expires_at >= before);
            Ok((count - sessions.len()) as u64)
        }
    }

    fn service() -> SessionService<MockSessionRepository> {
        SessionService::new(
            Arc::new(MockSessionRepository::default()),
            &SessionConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_create_validate_round_trip() {
        let service = service();
        let user_id = UserId::new_random();

        let session = service.create(&user_id).await.unwrap();
        let validated = service.validate(&session.token).await.unwrap().unwrap();

        assert_eq!(validated.user_id, user_id);
        assert_eq!(validated.token, session.token);
    }

    #[tokio::test]
    async fn test_validation_slides_expiry_forward() {
        let service = service();
        let user_id = UserId::new_random();

        let session = service.create(&user_id).await.unwrap();
        let first = service.validate(&session.token).await.unwrap().unwrap();
        let second = service.validate(&session.token).await.unwrap().unwrap();

        // Expiry never moves backwards under continued activity, and stays
        // exactly one window past the latest validation.
        assert!(second.expires_at >= first.expires_at);
        assert!(second.updated_at >= first.updated_at);
        assert_eq!(second.expires_at, second.updated_at + Duration::minutes(30));
    }

    #[tokio::test]
    async fn test_expired_session_reads_as_absent() {
        let repo = Arc::new(MockSessionRepository::default());
        let service = SessionService::new(repo.clone(), &SessionConfig::default());
        let user_id = UserId::new_random();

        let stale = Session::builder()
            .user_id(user_id)
            .expires_at(Utc::now() - Duration::seconds(1))
            .build()
            .unwrap();
        let token = stale.token.clone();
        repo.create(stale).await.unwrap();

        assert!(service.validate(&token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_token_is_none() {
        let service = service();
        let result = service.validate(&SessionToken::new_random()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_destroy_is_idempotent() {
        let service = service();
        let user_id = UserId::new_random();

        let session = service.create(&user_id).await.unwrap();
        service.destroy(&session.token).await.unwrap();
        service.destroy(&session.token).await.unwrap();

        assert!(service.validate(&session.token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_destroyed_and_expired_are_indistinguishable() {
        let repo = Arc::new(MockSessionRepository::default());
        let service = SessionService::new(repo.clone(), &SessionConfig::default());
        let user_id = UserId::new_random();

        let destroyed = service.create(&user_id).await.unwrap();
        service.destroy(&destroyed.token).await.unwrap();

        let expired = Session::builder()
            .user_id(user_id)
            .expires_at(Utc::now() - Duration::minutes(1))
            .build()
            .unwrap();
        let expired_token = expired.token.clone();
        repo.create(expired).await.unwrap();

        assert!(service.validate(&destroyed.token).await.unwrap().is_none());
        assert!(service.validate(&expired_token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_validate_is_authoritative_over_cache() {
        let repo = Arc::new(MockSessionRepository::default());
        let service = SessionService::new(repo.clone(), &SessionConfig::default());
        let user_id = UserId::new_random();

        let session = service.create(&user_id).await.unwrap();
        assert!(service.cached_user_id(&session.token).is_some());

        // Row vanishes behind the cache's back (another process revoked it).
        repo.delete(&session.token).await.unwrap();

        assert!(service.validate(&session.token).await.unwrap().is_none());
        // The stale cache entry was dropped too.
        assert!(service.cached_user_id(&session.token).is_none());
    }

    #[tokio::test]
    async fn test_destroy_for_user_leaves_others() {
        let service = service();
        let alice = UserId::new_random();
        let bob = UserId::new_random();

        let alice_session = service.create(&alice).await.unwrap();
        let bob_session = service.create(&bob).await.unwrap();

        service.destroy_for_user(&alice).await.unwrap();

        assert!(service.validate(&alice_session.token).await.unwrap().is_none());
        assert!(service.validate(&bob_session.token).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_sweep_removes_only_expired() {
        let repo = Arc::new(MockSessionRepository::default());
        let service = SessionService::new(repo.clone(), &SessionConfig::default());
        let user_id = UserId::new_random();

        let live = service.create(&user_id).await.unwrap();
        let stale = Session::builder()
            .user_id(user_id)
            .expires_at(Utc::now() - Duration::minutes(5))
            .build()
            .unwrap();
        repo.create(stale).await.unwrap();

        assert_eq!(service.sweep_expired().await.unwrap(), 1);
        assert!(service.validate(&live.token).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_cached_user_id_is_advisory() {
        let service = service();
        let user_id = UserId::new_random();

        let session = service.create(&user_id).await.unwrap();
        assert_eq!(service.cached_user_id(&session.token), Some(user_id));

        service.destroy(&session.token).await.unwrap();
        assert!(service.cached_user_id(&session.token).is_none());
    }
}
