//! Sliding-window sessions
//!
//! A session is `{ACTIVE}` from creation until its slide window passes with
//! no successful validation, after which it is observably absent. Expiry is
//! evaluated on read; nothing transitions a row to an "expired" state.
//!
//! | Field        | Type           | Description                                  |
//! | ------------ | -------------- | -------------------------------------------- |
//! | `token`      | `SessionToken` | Opaque, unguessable lookup key.              |
//! | `user_id`    | `UserId`       | Owner of the session.                        |
//! | `created_at` | `DateTime`     | Issuance time.                               |
//! | `updated_at` | `DateTime`     | Last successful validation.                  |
//! | `expires_at` | `DateTime`     | Always last-validated-at + the slide window. |

use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use rand::{TryRngCore, rngs::OsRng};
use serde::{Deserialize, Serialize};

use crate::{Error, error::ValidationError, user::UserId};

/// Generate a random string of the specified byte length, base64 URL-safe.
fn generate_random_string(length: usize) -> String {
    assert!(length >= 32, "token entropy must be at least 256 bits");
    let mut bytes = vec![0u8; length];
    OsRng.try_fill_bytes(&mut bytes).unwrap();
    BASE64_URL_SAFE_NO_PAD.encode(bytes)
}

/// An opaque session token with at least 256 bits of entropy, used for
/// lookups in the session store. The token itself carries no data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap an existing token string, e.g. one read from a cookie.
    pub fn new(token: &str) -> Self {
        SessionToken(token.to_string())
    }

    /// Create a new random token.
    pub fn new_random() -> Self {
        SessionToken(generate_random_string(32))
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionToken {
    fn default() -> Self {
        Self::new_random()
    }
}

impl From<String> for SessionToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionToken {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// The unique lookup key for the session.
    pub token: SessionToken,

    /// The owner of the session.
    pub user_id: UserId,

    /// When the session was issued.
    pub created_at: DateTime<Utc>,

    /// When the session was last validated.
    pub updated_at: DateTime<Utc>,

    /// When the session dies absent further activity.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

#[derive(Default)]
pub struct SessionBuilder {
    token: Option<SessionToken>,
    user_id: Option<UserId>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
}

impl SessionBuilder {
    pub fn token(mut self, token: SessionToken) -> Self {
        self.token = Some(token);
        self
    }

    pub fn user_id(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = Some(updated_at);
        self
    }

    pub fn expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn build(self) -> Result<Session, Error> {
        let now = Utc::now();
        Ok(Session {
            token: self.token.unwrap_or_default(),
            user_id: self.user_id.ok_or(ValidationError::MissingField(
                "User ID is required".to_string(),
            ))?,
            created_at: self.created_at.unwrap_or(now),
            updated_at: self.updated_at.unwrap_or(now),
            expires_at: self.expires_at.unwrap_or(now + Duration::minutes(30)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_randomness() {
        let a = SessionToken::new_random();
        let b = SessionToken::new_random();
        assert_ne!(a, b);
        // 32 bytes base64-encoded without padding is 43 characters.
        assert_eq!(a.as_str().len(), 43);
    }

    #[test]
    fn test_session_builder() {
        let session = Session::builder()
            .user_id(UserId::new_random())
            .expires_at(Utc::now() + Duration::minutes(30))
            .build()
            .unwrap();

        assert!(!session.is_expired());
    }

    #[test]
    fn test_session_builder_requires_user() {
        assert!(Session::builder().build().is_err());
    }

    #[test]
    fn test_expired_session() {
        let session = Session::builder()
            .user_id(UserId::new_random())
            .expires_at(Utc::now() - Duration::seconds(1))
            .build()
            .unwrap();

        assert!(session.is_expired());
    }
}
