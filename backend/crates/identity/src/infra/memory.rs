//! In-Memory User Store
//!
//! Uniqueness of user name and email is checked and claimed inside one
//! write lock, matching the unique indexes of the PostgreSQL schema.

use std::collections::HashMap;
use std::sync::Arc;

use kernel::id::UserId;
use parking_lot::RwLock;

use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{email::Email, user_name::UserName};
use crate::error::{IdentityError, IdentityResult};

/// Thread-safe in-memory user store
#[derive(Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<RwLock<HashMap<UserId, User>>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserRepository for MemoryUserStore {
    async fn create(&self, user: &User) -> IdentityResult<()> {
        let mut users = self.users.write();

        if users
            .values()
            .any(|u| u.user_name.canonical() == user.user_name.canonical())
        {
            return Err(IdentityError::UserNameTaken);
        }
        if users.values().any(|u| u.email == user.email) {
            return Err(IdentityError::EmailTaken);
        }

        users.insert(user.user_id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> IdentityResult<Option<User>> {
        Ok(self.users.read().get(user_id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> IdentityResult<Option<User>> {
        Ok(self
            .users
            .read()
            .values()
            .find(|u| &u.email == email)
            .cloned())
    }

    async fn exists_by_user_name(&self, user_name: &UserName) -> IdentityResult<bool> {
        Ok(self
            .users
            .read()
            .values()
            .any(|u| u.user_name.canonical() == user_name.canonical()))
    }

    async fn exists_by_email(&self, email: &Email) -> IdentityResult<bool> {
        Ok(self.users.read().values().any(|u| &u.email == email))
    }
}
