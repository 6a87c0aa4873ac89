//! Security event emission
//!
//! The login orchestrator and admin actions emit [`SecurityEvent`]s so that
//! collaborators outside the core (audit log, alerting, SSE fan-out) can
//! observe security-relevant transitions. Handler failures are logged and
//! swallowed: the audit trail observes logins, it never gates them.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{error::EventError, session::SessionToken, user::UserId};

/// Security-relevant transitions emitted by the engine.
#[derive(Debug, Clone)]
pub enum SecurityEvent {
    /// A login attempt succeeded and a session was minted.
    LoginSucceeded {
        user_id: UserId,
        ip_address: String,
        timestamp: DateTime<Utc>,
    },

    /// A login attempt failed (bad password or unknown username).
    LoginFailed {
        /// The username that was attempted; may not exist.
        username: String,
        ip_address: String,
        timestamp: DateTime<Utc>,
    },

    /// An account crossed the failure threshold or was locked by an admin.
    AccountLocked {
        user_id: UserId,
        timestamp: DateTime<Utc>,
    },

    /// An admin unlocked an account.
    AccountUnlocked {
        user_id: UserId,
        timestamp: DateTime<Utc>,
    },

    /// An address crossed the failure threshold and was blocked.
    IpBlocked {
        ip_address: String,
        timestamp: DateTime<Utc>,
    },

    /// An admin lifted an address block.
    IpUnblocked {
        ip_address: String,
        timestamp: DateTime<Utc>,
    },

    /// A session was explicitly destroyed (logout or admin revocation).
    SessionRevoked {
        token: SessionToken,
        timestamp: DateTime<Utc>,
    },
}

/// Receives emitted events. Implementations must be cheap or hand off to
/// their own queue; emission happens on the request path.
#[async_trait]
pub trait EventHandler: Send + Sync + 'static {
    async fn handle_event(&self, event: &SecurityEvent) -> Result<(), EventError>;
}

/// Dispatches events to every registered handler.
#[derive(Clone, Default)]
pub struct EventBus {
    handlers: Arc<RwLock<Vec<Arc<dyn EventHandler>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, handler: Arc<dyn EventHandler>) {
        self.handlers.write().await.push(handler);
    }

    /// Emit an event to all registered handlers. A failing handler is logged
    /// and does not stop delivery to the rest.
    pub async fn emit(&self, event: &SecurityEvent) {
        for handler in self.handlers.read().await.iter() {
            if let Err(e) = handler.handle_event(event).await {
                tracing::warn!(error = %e, ?event, "Security event handler failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter(AtomicUsize);

    #[async_trait]
    impl EventHandler for Counter {
        async fn handle_event(&self, _event: &SecurityEvent) -> Result<(), EventError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl EventHandler for Failing {
        async fn handle_event(&self, _event: &SecurityEvent) -> Result<(), EventError> {
            Err(EventError::Handler("boom".to_string()))
        }
    }

    #[tokio::test]
    async fn test_emit_reaches_all_handlers() {
        let bus = EventBus::new();
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        bus.register(counter.clone()).await;
        bus.register(Arc::new(Failing)).await;
        let counter2 = Arc::new(Counter(AtomicUsize::new(0)));
        bus.register(counter2.clone()).await;

        bus.emit(&SecurityEvent::IpUnblocked {
            ip_address: "10.0.0.5".to_string(),
            timestamp: Utc::now(),
        })
        .await;

        // The failing handler did not stop delivery.
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
        assert_eq!(counter2.0.load(Ordering::SeqCst), 1);
    }
}
