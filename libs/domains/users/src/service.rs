//! User Service - Business logic layer

use std::sync::Arc;
use tracing::instrument;
use validator::Validate;

use crate::error::{UserError, UserResult};
use crate::models::{CreateUser, Selector, User, UserPatch};
use crate::repository::UserRepository;

/// User service providing business logic operations
///
/// The service layer handles validation, business rules, and orchestrates
/// repository operations.
pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
}

impl<R: UserRepository> UserService<R> {
    /// Create a new UserService with the given repository
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Register a new user
    ///
    /// Both fields must be present and the email must not already be
    /// registered.
    #[instrument(skip(self, input), fields(user_email = %input.email))]
    pub async fn create_user(&self, input: CreateUser) -> UserResult<User> {
        input
            .validate()
            .map_err(|e| UserError::Validation(e.to_string()))?;

        if self.repository.exists_by_email(&input.email).await? {
            return Err(UserError::DuplicateEmail(input.email));
        }

        self.repository.create(input).await
    }

    /// List every user, unfiltered
    #[instrument(skip(self))]
    pub async fn list_users(&self) -> UserResult<Vec<User>> {
        self.repository.list().await
    }

    /// Update the first user matching the selector.
    ///
    /// Only the supplied patch fields change. Email uniqueness is not
    /// re-checked here; the store-level index still rejects collisions.
    #[instrument(skip(self, patch))]
    pub async fn update_user(&self, selector: &Selector, patch: UserPatch) -> UserResult<User> {
        self.repository.update(selector, patch).await
    }

    /// Delete the first user matching the selector, returning its prior state
    #[instrument(skip(self))]
    pub async fn delete_user(&self, selector: &Selector) -> UserResult<User> {
        self.repository.delete(selector).await
    }
}

impl<R: UserRepository> Clone for UserService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}
