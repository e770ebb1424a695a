//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.

use kernel::id::UserId;

use crate::domain::entity::user::User;
use crate::domain::value_object::{email::Email, user_name::UserName};
use crate::error::IdentityResult;

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Create a new user
    ///
    /// Fails with `UserNameTaken` / `EmailTaken` when a concurrent
    /// registration won the unique slot.
    async fn create(&self, user: &User) -> IdentityResult<()>;

    /// Find user by ID
    async fn find_by_id(&self, user_id: &UserId) -> IdentityResult<Option<User>>;

    /// Find user by (lowercase) email
    async fn find_by_email(&self, email: &Email) -> IdentityResult<Option<User>>;

    /// Check if user name exists (case-insensitive)
    async fn exists_by_user_name(&self, user_name: &UserName) -> IdentityResult<bool>;

    /// Check if email exists
    async fn exists_by_email(&self, email: &Email) -> IdentityResult<bool>;
}
