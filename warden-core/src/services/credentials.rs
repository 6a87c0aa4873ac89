//! Credential verification and account provisioning.
//!
//! Username lookups are case-insensitive; password checks go through a
//! salted one-way hash. Verification returns `None` for unknown usernames
//! and wrong passwords alike; only the login orchestrator distinguishes the
//! two, and only to update the right failure counters.
//!
//! Verification timing is not equalized between the two failure cases: an
//! unknown username skips the hash comparison entirely.

use crate::{
    Error, User, UserId,
    error::ValidationError,
    repositories::{PasswordRepository, UserRepository},
    user::{NewUser, Role},
};
use std::sync::Arc;

const MIN_PASSWORD_LEN: usize = 8;
const MAX_USERNAME_LEN: usize = 32;

fn validate_username(username: &str) -> Result<(), Error> {
    if username.is_empty() {
        return Err(ValidationError::MissingField("username".to_string()).into());
    }
    if username.len() > MAX_USERNAME_LEN {
        return Err(ValidationError::InvalidUsername("too long".to_string()).into());
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(ValidationError::InvalidUsername(
            "only letters, digits, '.', '_' and '-' are allowed".to_string(),
        )
        .into());
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), Error> {
    if password.is_empty() {
        return Err(ValidationError::MissingField("password".to_string()).into());
    }
    if password.len() < MIN_PASSWORD_LEN {
        return Err(ValidationError::InvalidPassword(format!(
            "must be at least {MIN_PASSWORD_LEN} characters"
        ))
        .into());
    }
    Ok(())
}

/// Service for password verification and account provisioning.
pub struct CredentialService<U: UserRepository, P: PasswordRepository> {
    user_repository: Arc<U>,
    password_repository: Arc<P>,
}

impl<U: UserRepository, P: PasswordRepository> CredentialService<U, P> {
    pub fn new(user_repository: Arc<U>, password_repository: Arc<P>) -> Self {
        Self {
            user_repository,
            password_repository,
        }
    }

    /// Look up a user by username, case-insensitively.
    pub async fn find_user(&self, username: &str) -> Result<Option<User>, Error> {
        self.user_repository.find_by_username(username).await
    }

    /// Check a plaintext password against the user's stored hash. A user
    /// without a hash fails the check; it is not an error.
    pub async fn check_password(&self, user: &User, password: &str) -> Result<bool, Error> {
        let Some(hash) = self.password_repository.get_password_hash(&user.id).await? else {
            return Ok(false);
        };
        Ok(Self::verify_hash(password, &hash))
    }

    /// Verify a username/password pair. `None` for unknown username or wrong
    /// password; callers cannot tell which.
    pub async fn verify(&self, username: &str, password: &str) -> Result<Option<User>, Error> {
        let Some(user) = self.find_user(username).await? else {
            return Ok(None);
        };

        if self.check_password(&user, password).await? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    /// Create a user with a password. Duplicate usernames (case-insensitive)
    /// are rejected before the insert.
    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<User, Error> {
        validate_username(username)?;
        validate_password(password)?;

        if self.find_user(username).await?.is_some() {
            return Err(ValidationError::UsernameTaken.into());
        }

        let password_hash = Self::hash_password(password);

        let user = self
            .user_repository
            .create(NewUser::new(username, role))
            .await?;

        self.password_repository
            .set_password_hash(&user.id, &password_hash)
            .await?;

        Ok(user)
    }

    /// Set a user's password (admin operation, no old password required)
    pub async fn set_password(&self, user_id: &UserId, password: &str) -> Result<(), Error> {
        validate_password(password)?;

        let hash = Self::hash_password(password);
        self.password_repository
            .set_password_hash(user_id, &hash)
            .await
    }

    /// Hash a password using argon2
    fn hash_password(password: &str) -> String {
        use password_auth::generate_hash;
        generate_hash(password)
    }

    /// Verify a password against a hash
    fn verify_hash(password: &str, hash: &str) -> bool {
        use password_auth::verify_password;
        verify_password(password, hash).is_ok()
    }
}
