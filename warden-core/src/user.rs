//! User accounts, from the security core's point of view
//!
//! Only the fields that participate in authentication and lockout live here.
//! The rest of a user's profile belongs to the surrounding application.
//!
//! | Field             | Type               | Description                                     |
//! | ----------------- | ------------------ | ----------------------------------------------- |
//! | `id`              | `UserId`           | Opaque, stable identifier.                      |
//! | `username`        | `String`           | Case-insensitively unique login name.           |
//! | `role`            | `Role`             | Coarse authorization role.                      |
//! | `failed_attempts` | `u32`              | Consecutive failed logins since the last reset. |
//! | `locked_at`       | `Option<DateTime>` | Set while the account is locked.                |

use crate::{
    Error,
    error::ValidationError,
    id::{generate_prefixed_id, validate_prefixed_id},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A unique, stable identifier for a specific user.
///
/// Treat the value as opaque; it is not a UUID even when it looks like one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: &str) -> Self {
        UserId(id.to_string())
    }

    pub fn new_random() -> Self {
        UserId(generate_prefixed_id("usr"))
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate that this ID has the correct format for a user ID
    pub fn is_valid(&self) -> bool {
        validate_prefixed_id(&self.0, "usr")
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new_random()
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Coarse role used by the ticketing dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full administrative access, including lock/unlock actions.
    Admin,
    /// Works tickets assigned to them.
    Agent,
    /// Files and tracks their own tickets.
    Requester,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Agent => "agent",
            Role::Requester => "requester",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "agent" => Ok(Role::Agent),
            "requester" => Ok(Role::Requester),
            other => Err(ValidationError::InvalidRole(other.to_string()).into()),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user account as the security core sees it.
///
/// The password hash is deliberately not part of this struct; it stays behind
/// the password repository and never travels with the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,

    pub username: String,

    pub role: Role,

    /// Consecutive failed login attempts since the last successful login or
    /// explicit reset.
    pub failed_attempts: u32,

    /// Set while the account is locked. Locked accounts cannot authenticate
    /// regardless of password correctness until explicitly unlocked.
    pub locked_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_locked(&self) -> bool {
        self.locked_at.is_some()
    }

    /// The projection handed to authenticated callers.
    pub fn public(&self) -> SessionUser {
        SessionUser {
            id: self.id.clone(),
            username: self.username.clone(),
            role: self.role,
        }
    }
}

/// The public subset of a user returned to protected routes: never the hash,
/// never the lock state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: UserId,
    pub username: String,
    pub role: Role,
}

/// Payload for creating a user row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub id: UserId,
    pub username: String,
    pub role: Role,
}

impl NewUser {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            id: UserId::new_random(),
            username: username.into(),
            role,
        }
    }

    pub fn with_id(id: UserId, username: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            username: username.into(),
            role,
        }
    }
}
