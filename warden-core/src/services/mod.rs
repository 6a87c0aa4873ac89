//! Service layer for the security core
//!
//! Each service wraps one concern: the fixed-window rate limiter, the
//! blocked-IP store, the account lockout store, credential verification, and
//! the sliding-window session store. The `warden` facade composes them into
//! the login decision procedure.

pub mod account_lock;
pub mod credentials;
pub mod ip_block;
pub mod rate_limit;
pub mod session;

pub use account_lock::{AccountLockService, LockoutStatus};
pub use credentials::CredentialService;
pub use ip_block::IpBlockService;
pub use rate_limit::FixedWindowLimiter;
pub use session::SessionService;
