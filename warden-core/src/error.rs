//! Error taxonomy for the security core.
//!
//! Errors split into two kinds with different handling rules:
//!
//! - [`PolicyRejection`] — expected, user-facing outcomes of the login
//!   decision procedure. Carried with a stable machine-readable code and
//!   never logged as application errors.
//! - Everything else ([`StorageError`], [`CryptoError`], [`ValidationError`])
//!   — infrastructure or caller failures. Logged with detail server-side and
//!   surfaced to clients only as a generic failure. A store outage denies the
//!   login attempt; it never bypasses a security check.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Policy(#[from] PolicyRejection),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Cryptographic error: {0}")]
    Crypto(#[from] CryptoError),
}

/// Expected rejection of a login or session operation.
///
/// These map one-to-one onto the wire contract: a machine code, an HTTP
/// status, and optional hint fields. The mapping is applied only at the
/// boundary; inside the core these are ordinary values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyRejection {
    #[error("Too many failed attempts from this address, try again later")]
    IpBlocked {
        /// Seconds until the block expires.
        retry_after_secs: i64,
    },

    #[error("Too many requests, slow down")]
    RateLimited {
        /// Seconds until the current window rolls over.
        retry_after_secs: u64,
    },

    #[error("Account is locked, contact an administrator")]
    AccountLocked,

    #[error("Invalid username or password")]
    InvalidCredentials {
        /// Failed attempts left before the account locks, surfaced only when
        /// the caller is close to the threshold.
        remaining_attempts: Option<u32>,
        /// Failed attempts left before the source address is blocked.
        remaining_ip_attempts: Option<u32>,
    },
}

impl PolicyRejection {
    /// Stable machine-readable code. Invalid credentials intentionally carry
    /// no code so the response stays generic.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            PolicyRejection::IpBlocked { .. } => Some("IP_BLOCKED"),
            PolicyRejection::RateLimited { .. } => Some("RATE_LIMITED"),
            PolicyRejection::AccountLocked => Some("ACCOUNT_LOCKED"),
            PolicyRejection::InvalidCredentials { .. } => None,
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            PolicyRejection::IpBlocked { .. } => 403,
            PolicyRejection::RateLimited { .. } => 429,
            PolicyRejection::AccountLocked => 403,
            PolicyRejection::InvalidCredentials { .. } => 401,
        }
    }

    /// Retry hint in seconds, for rejections that expire on their own.
    pub fn retry_after_secs(&self) -> Option<i64> {
        match self {
            PolicyRejection::IpBlocked { retry_after_secs } => Some(*retry_after_secs),
            PolicyRejection::RateLimited { retry_after_secs } => Some(*retry_after_secs as i64),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Record not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Unknown role: {0}")]
    InvalidRole(String),

    #[error("Username already taken")]
    UsernameTaken,

    #[error("Cannot lock your own account")]
    SelfLock,
}

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),
}

#[derive(Debug, Error)]
pub enum EventError {
    #[error("Event handler error: {0}")]
    Handler(String),
}

impl Error {
    /// True for expected, user-facing rejections.
    pub fn is_policy_rejection(&self) -> bool {
        matches!(self, Error::Policy(_))
    }

    /// True for failures that must be logged in full and surfaced generically.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, Error::Storage(_) | Error::Crypto(_))
    }

    /// HTTP status for the boundary. Infrastructure failures collapse to 500
    /// regardless of detail; validation errors are caller mistakes.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::Policy(rejection) => rejection.http_status(),
            Error::Validation(_) => 400,
            Error::Storage(_) | Error::Crypto(_) => 500,
        }
    }
}
