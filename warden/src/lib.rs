//! # Warden
//!
//! Warden is the account-security and session-lifecycle engine behind a
//! ticketing application: coordinated brute-force defense (per-IP blocking,
//! per-account lockout, fixed-window rate limiting) composed with a
//! sliding-window server-side session store.
//!
//! The [`Warden`] struct is the composition point. It owns one instance of
//! each service and runs the login decision procedure in a strict order:
//! IP-block check, then rate limit, then user lookup, then lock check, then
//! password verification. The cheap checks run first so a blocked client
//! never costs a hash comparison.
//!
//! Everything durable goes through a [`RepositoryProvider`]; the
//! process-local pieces (rate limiter windows, IP attempt counters, session
//! cache) reset on restart by design.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use warden::{Role, Warden};
//! use warden_storage_sqlite::SqliteRepositoryProvider;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = sqlx::SqlitePool::connect("sqlite:warden.db").await?;
//!     let warden = Warden::new(Arc::new(SqliteRepositoryProvider::new(pool)));
//!     warden.migrate().await?;
//!
//!     warden.create_user("bob", "correct123", Role::Agent).await?;
//!     let login = warden.login("bob", "correct123", "203.0.113.7").await?;
//!     println!("session token: {}", login.session.token);
//!
//!     Ok(())
//! }
//! ```

pub mod cookie;
pub mod response;

use std::sync::Arc;

use chrono::Utc;

use warden_core::{
    events::EventBus,
    repositories::{
        IpBlockRepositoryAdapter, LockoutRepositoryAdapter, PasswordRepositoryAdapter,
        RepositoryProvider, SessionRepositoryAdapter, UserRepository, UserRepositoryAdapter,
    },
    services::{
        AccountLockService, CredentialService, FixedWindowLimiter, IpBlockService, SessionService,
    },
};

/// Re-export core types from warden_core
///
/// These types are commonly used when working with the Warden API.
pub use warden_core::{
    Error, PolicyRejection, Role, SecurityConfig, Session, SessionToken, SessionUser, User, UserId,
    config::{IpBlockConfig, LockoutConfig, RateLimitConfig, SessionConfig},
    error::ValidationError,
    events::{EventHandler, SecurityEvent},
};

pub use cookie::SessionCookie;
pub use response::{BlockedIpView, LoginResponse};

/// Re-export storage backends
#[cfg(feature = "sqlite")]
pub use warden_storage_sqlite::SqliteRepositoryProvider;

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginSuccess {
    /// Public projection of the authenticated user.
    pub user: SessionUser,
    /// The freshly minted session; its token goes into the cookie.
    pub session: Session,
}

/// Rows removed by [`Warden::sweep_expired`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub sessions_removed: u64,
    pub blocks_removed: u64,
}

/// The login orchestrator and admin surface.
///
/// Construct one instance per process and share it; all internal state is
/// either behind the repository provider or in concurrent maps.
pub struct Warden<R: RepositoryProvider> {
    config: SecurityConfig,
    user_repository: Arc<UserRepositoryAdapter<R>>,
    credential_service:
        Arc<CredentialService<UserRepositoryAdapter<R>, PasswordRepositoryAdapter<R>>>,
    session_service: Arc<SessionService<SessionRepositoryAdapter<R>>>,
    account_lock_service: Arc<AccountLockService<LockoutRepositoryAdapter<R>>>,
    ip_block_service: Arc<IpBlockService<IpBlockRepositoryAdapter<R>>>,
    rate_limiter: FixedWindowLimiter,
    events: EventBus,
    repositories: Arc<R>,
}

impl<R: RepositoryProvider> Warden<R> {
    /// Create a new Warden instance with the default configuration.
    pub fn new(repositories: Arc<R>) -> Self {
        Self::with_config(repositories, SecurityConfig::default())
    }

    /// Create a new Warden instance with an explicit configuration.
    pub fn with_config(repositories: Arc<R>, config: SecurityConfig) -> Self {
        let user_repository = Arc::new(UserRepositoryAdapter::new(repositories.clone()));
        let password_repository = Arc::new(PasswordRepositoryAdapter::new(repositories.clone()));
        let session_repository = Arc::new(SessionRepositoryAdapter::new(repositories.clone()));
        let lockout_repository = Arc::new(LockoutRepositoryAdapter::new(repositories.clone()));
        let ip_block_repository = Arc::new(IpBlockRepositoryAdapter::new(repositories.clone()));

        let credential_service = Arc::new(CredentialService::new(
            user_repository.clone(),
            password_repository,
        ));
        let session_service = Arc::new(SessionService::new(session_repository, &config.session));
        let account_lock_service = Arc::new(AccountLockService::new(
            lockout_repository,
            config.lockout.clone(),
        ));
        let ip_block_service = Arc::new(IpBlockService::new(
            ip_block_repository,
            config.ip_block.clone(),
        ));
        let rate_limiter = FixedWindowLimiter::new(&config.rate_limit);

        Self {
            config,
            user_repository,
            credential_service,
            session_service,
            account_lock_service,
            ip_block_service,
            rate_limiter,
            events: EventBus::new(),
            repositories,
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &SecurityConfig {
        &self.config
    }

    /// The event bus; register handlers here to observe security events.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Run storage migrations.
    pub async fn migrate(&self) -> Result<(), Error> {
        self.repositories.migrate().await
    }

    /// Check that the storage backend is reachable.
    pub async fn health_check(&self) -> Result<(), Error> {
        self.repositories.health_check().await
    }

    /// Provision a user with a password.
    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<User, Error> {
        self.credential_service
            .create_user(username, password, role)
            .await
    }

    /// Set a user's password (admin operation, no old password required).
    pub async fn set_password(&self, user_id: &UserId, password: &str) -> Result<(), Error> {
        self.credential_service.set_password(user_id, password).await
    }

    /// Run one login attempt through the decision procedure.
    ///
    /// The check order is load-bearing and must not be rearranged: a blocked
    /// or rate-limited client is turned away before any credential work, and
    /// a locked account is turned away before the password is verified.
    ///
    /// Policy rejections come back as [`Error::Policy`]; anything else is an
    /// infrastructure failure and the attempt is denied.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        client_ip: &str,
    ) -> Result<LoginSuccess, Error> {
        // 1. Standing block for this address?
        if let Some(block) = self.ip_block_service.is_blocked(client_ip).await? {
            return Err(PolicyRejection::IpBlocked {
                retry_after_secs: block.seconds_remaining(Utc::now()),
            }
            .into());
        }

        // 2. Throttle. A denied request touches no failure counters.
        let rate_key = format!("login:{client_ip}");
        if !self
            .rate_limiter
            .check(self.config.rate_limit.login_limit, &rate_key)
        {
            let retry_after_secs = self
                .rate_limiter
                .retry_after(&rate_key)
                .map(|d| d.as_secs())
                .unwrap_or(0);
            return Err(PolicyRejection::RateLimited { retry_after_secs }.into());
        }

        // 3. Look up the account. An unknown username counts against the
        // address but the response never reveals whether the user exists.
        let Some(user) = self.credential_service.find_user(username).await? else {
            let became_blocked = self.ip_block_service.record_failed_attempt(client_ip).await?;
            self.emit_login_failure(username, client_ip, became_blocked)
                .await;
            return Err(PolicyRejection::InvalidCredentials {
                remaining_attempts: None,
                remaining_ip_attempts: None,
            }
            .into());
        };

        // 4. Locked accounts fail regardless of the password. This branch
        // deliberately does not feed the IP counter; an attempt against a
        // real-but-locked account is not treated as address abuse. Pending
        // product sign-off before unifying with the unknown-user path.
        if user.is_locked() {
            return Err(PolicyRejection::AccountLocked.into());
        }

        // 5. Verify the password.
        if !self.credential_service.check_password(&user, password).await? {
            // Both counters are recorded before the response is built; if
            // either store write fails, the whole attempt fails.
            let (became_blocked, lock_status) = tokio::join!(
                self.ip_block_service.record_failed_attempt(client_ip),
                self.account_lock_service.record_failed_attempt(&user.id),
            );
            let became_blocked = became_blocked?;
            let lock_status = lock_status?;

            self.emit_login_failure(username, client_ip, became_blocked)
                .await;
            if lock_status.locked {
                self.events
                    .emit(&SecurityEvent::AccountLocked {
                        user_id: user.id.clone(),
                        timestamp: Utc::now(),
                    })
                    .await;
            }

            // An address block overrides account-lock messaging.
            if became_blocked {
                return Err(PolicyRejection::IpBlocked {
                    retry_after_secs: self.config.ip_block.block_duration.num_seconds(),
                }
                .into());
            }
            if lock_status.locked {
                return Err(PolicyRejection::AccountLocked.into());
            }

            let remaining_ip = self.ip_block_service.remaining_attempts(client_ip);
            return Err(PolicyRejection::InvalidCredentials {
                remaining_attempts: (lock_status.remaining_attempts <= 3)
                    .then_some(lock_status.remaining_attempts),
                remaining_ip_attempts: (remaining_ip <= 3).then_some(remaining_ip),
            }
            .into());
        }

        // Success: clear both failure counters, then mint the session.
        self.ip_block_service.reset_attempts(client_ip);
        self.account_lock_service.reset_attempts(&user.id).await?;

        let session = self.session_service.create(&user.id).await?;

        self.events
            .emit(&SecurityEvent::LoginSucceeded {
                user_id: user.id.clone(),
                ip_address: client_ip.to_string(),
                timestamp: Utc::now(),
            })
            .await;

        Ok(LoginSuccess {
            user: user.public(),
            session,
        })
    }

    /// Resolve a session token to its user, sliding the session's expiry.
    ///
    /// `None` means "not authenticated" — expired, revoked, and never-issued
    /// tokens are indistinguishable here, and callers should redirect to
    /// login.
    pub async fn authenticate(&self, token: &SessionToken) -> Result<Option<SessionUser>, Error> {
        let Some(session) = self.session_service.validate(token).await? else {
            return Ok(None);
        };

        let user = self.user_repository.find_by_id(&session.user_id).await?;
        Ok(user.map(|u| u.public()))
    }

    /// Destroy a session. Idempotent.
    pub async fn logout(&self, token: &SessionToken) -> Result<(), Error> {
        self.session_service.destroy(token).await?;
        self.events
            .emit(&SecurityEvent::SessionRevoked {
                token: token.clone(),
                timestamp: Utc::now(),
            })
            .await;
        Ok(())
    }

    /// Currently blocked addresses with computed seconds remaining. Expired
    /// rows are swept before listing.
    pub async fn list_blocked_ips(&self) -> Result<Vec<BlockedIpView>, Error> {
        let now = Utc::now();
        let blocks = self.ip_block_service.list_blocked().await?;
        Ok(blocks
            .iter()
            .map(|block| BlockedIpView::from_block(block, now))
            .collect())
    }

    /// Lift a block by address. Returns `false` when none existed.
    pub async fn unblock_ip(&self, ip_address: &str) -> Result<bool, Error> {
        let removed = self.ip_block_service.unblock(ip_address).await?;
        if removed {
            self.events
                .emit(&SecurityEvent::IpUnblocked {
                    ip_address: ip_address.to_string(),
                    timestamp: Utc::now(),
                })
                .await;
        }
        Ok(removed)
    }

    /// Lift a block by row id. Returns `false` when none existed.
    pub async fn unblock_ip_by_id(&self, id: i64) -> Result<bool, Error> {
        self.ip_block_service.unblock_by_id(id).await
    }

    /// Admin: lock an account without a threshold breach. Self-locking is
    /// rejected; the target's live sessions are revoked so the lock takes
    /// effect immediately. Returns `false` when the target does not exist.
    pub async fn lock_user(&self, actor: &UserId, target: &UserId) -> Result<bool, Error> {
        if actor == target {
            return Err(warden_core::error::ValidationError::SelfLock.into());
        }

        let locked = self.account_lock_service.lock(target).await?;
        if locked {
            self.session_service.destroy_for_user(target).await?;
            tracing::info!(actor = %actor, target = %target, "Account locked by administrator");
            self.events
                .emit(&SecurityEvent::AccountLocked {
                    user_id: target.clone(),
                    timestamp: Utc::now(),
                })
                .await;
        }
        Ok(locked)
    }

    /// Admin: unlock an account, resetting its failure counter. Returns
    /// `false` when the target does not exist.
    pub async fn unlock_user(&self, user_id: &UserId) -> Result<bool, Error> {
        let unlocked = self.account_lock_service.unlock(user_id).await?;
        if unlocked {
            tracing::info!(user_id = %user_id, "Account unlocked by administrator");
            self.events
                .emit(&SecurityEvent::AccountUnlocked {
                    user_id: user_id.clone(),
                    timestamp: Utc::now(),
                })
                .await;
        }
        Ok(unlocked)
    }

    /// Remove expired sessions and lapsed IP blocks. Intended to run
    /// periodically from a scheduler; every read path also re-checks expiry
    /// on its own, so this only bounds storage growth.
    pub async fn sweep_expired(&self) -> Result<SweepStats, Error> {
        let sessions_removed = self.session_service.sweep_expired().await?;
        let blocks_removed = self.ip_block_service.clean_expired().await?;
        Ok(SweepStats {
            sessions_removed,
            blocks_removed,
        })
    }

    async fn emit_login_failure(&self, username: &str, client_ip: &str, became_blocked: bool) {
        self.events
            .emit(&SecurityEvent::LoginFailed {
                username: username.to_string(),
                ip_address: client_ip.to_string(),
                timestamp: Utc::now(),
            })
            .await;
        if became_blocked {
            self.events
                .emit(&SecurityEvent::IpBlocked {
                    ip_address: client_ip.to_string(),
                    timestamp: Utc::now(),
                })
                .await;
        }
    }
}
