//! User Entity
//!
//! Registered community member. The reputation counters are owned by the
//! forum workflows; identity only reads them.

use chrono::{DateTime, Utc};
use kernel::id::UserId;
use platform::password::HashedPassword;

use crate::domain::value_object::{email::Email, user_name::UserName};

/// User entity
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: UserId,
    /// Unique handle (case-insensitive)
    pub user_name: UserName,
    /// Unique, stored lowercase
    pub email: Email,
    /// Credential secret, never leaves the identity crate
    pub password_hash: HashedPassword,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub problems_solved: i64,
    pub solutions_provided: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with zeroed counters
    pub fn new(user_name: UserName, email: Email, password_hash: HashedPassword) -> Self {
        let now = Utc::now();

        Self {
            user_id: UserId::new(),
            user_name,
            email,
            password_hash,
            avatar: None,
            bio: None,
            problems_solved: 0,
            solutions_provided: 0,
            created_at: now,
            updated_at: now,
        }
    }
}
