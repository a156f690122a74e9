use async_trait::async_trait;

use crate::error::UserResult;
use crate::models::{CreateUser, Selector, User, UserPatch};

/// Repository trait for User persistence
///
/// This trait defines the data access interface for users.
/// Implementations can use different storage backends (MongoDB, etc.)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user built from the input
    async fn create(&self, input: CreateUser) -> UserResult<User>;

    /// List all users, unfiltered
    async fn list(&self) -> UserResult<Vec<User>>;

    /// Find the first user matching the selector
    async fn find_one(&self, selector: &Selector) -> UserResult<Option<User>>;

    /// Apply the patch to the first user matching the selector and return
    /// the post-update record; fails with NotFound when nothing matches
    async fn update(&self, selector: &Selector, patch: UserPatch) -> UserResult<User>;

    /// Remove the first user matching the selector and return its prior
    /// state; fails with NotFound when nothing matches
    async fn delete(&self, selector: &Selector) -> UserResult<User>;

    /// Check whether any user has the given email
    async fn exists_by_email(&self, email: &str) -> UserResult<bool>;
}
