//! In-memory UserRepository used by unit tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{UserError, UserResult};
use crate::models::{CreateUser, Selector, User, UserPatch};
use crate::repository::UserRepository;

/// Keeps users in a Vec behind a Mutex and mirrors the MongoDB repository's
/// semantics: oldest-first matching and a unique email constraint on insert.
#[derive(Default)]
pub(crate) struct MemoryUserRepository {
    users: Mutex<Vec<User>>,
}

impl MemoryUserRepository {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn matches(user: &User, selector: &Selector) -> bool {
        match selector {
            Selector::ById(id) => user.id == *id,
            Selector::ByEmail(email) => user.email == *email,
            Selector::ByName(name) => user.name == *name,
        }
    }

    // Insertion order stands in for the created_at sort
    fn position(users: &[User], selector: &Selector) -> Option<usize> {
        users.iter().position(|u| Self::matches(u, selector))
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create(&self, input: CreateUser) -> UserResult<User> {
        let mut users = self.users.lock().unwrap();

        if users.iter().any(|u| u.email == input.email) {
            return Err(UserError::DuplicateEmail(input.email));
        }

        let user = User::new(input);
        users.push(user.clone());
        Ok(user)
    }

    async fn list(&self) -> UserResult<Vec<User>> {
        Ok(self.users.lock().unwrap().clone())
    }

    async fn find_one(&self, selector: &Selector) -> UserResult<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(Self::position(&users, selector).map(|i| users[i].clone()))
    }

    async fn update(&self, selector: &Selector, patch: UserPatch) -> UserResult<User> {
        let mut users = self.users.lock().unwrap();

        let index = Self::position(&users, selector).ok_or(UserError::NotFound)?;
        users[index].apply_patch(patch);
        Ok(users[index].clone())
    }

    async fn delete(&self, selector: &Selector) -> UserResult<User> {
        let mut users = self.users.lock().unwrap();

        let index = Self::position(&users, selector).ok_or(UserError::NotFound)?;
        Ok(users.remove(index))
    }

    async fn exists_by_email(&self, email: &str) -> UserResult<bool> {
        Ok(self.users.lock().unwrap().iter().any(|u| u.email == email))
    }
}
