use crate::{Error, User, UserId, user::NewUser};
use async_trait::async_trait;

/// Repository for user data access.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Create a new user. Fails with a constraint error when the username is
    /// already taken (case-insensitively).
    async fn create(&self, user: NewUser) -> Result<User, Error>;

    /// Find a user by ID
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, Error>;

    /// Find a user by username, matching case-insensitively.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, Error>;
}
