use crate::{Error, UserId};
use async_trait::async_trait;

/// Repository for password hashes.
///
/// Hashes live behind this trait so they never travel with the [`crate::User`]
/// struct. Only the credential service reads them.
#[async_trait]
pub trait PasswordRepository: Send + Sync + 'static {
    /// Store a password hash for a user
    async fn set_password_hash(&self, user_id: &UserId, hash: &str) -> Result<(), Error>;

    /// Retrieve a user's password hash, `None` if the user has no password set
    async fn get_password_hash(&self, user_id: &UserId) -> Result<Option<String>, Error>;
}
