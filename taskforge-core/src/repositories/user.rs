use crate::{Error, User, user::NewUser};
use async_trait::async_trait;

/// Repository for user account data access.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Create a new user
    async fn create(&self, user: NewUser) -> Result<User, Error>;

    /// Find a user by username
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, Error>;

    /// Find a user by email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error>;

    /// Find a user whose username or email matches the identifier
    async fn find_by_username_or_email(&self, identifier: &str) -> Result<Option<User>, Error>;

    /// Check whether a username is taken
    async fn exists_by_username(&self, username: &str) -> Result<bool, Error>;

    /// Check whether an email is taken
    async fn exists_by_email(&self, email: &str) -> Result<bool, Error>;

    /// Persist changes to an existing user (last writer wins)
    async fn update(&self, user: &User) -> Result<User, Error>;
}
