//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entity::user::User;

// ============================================================================
// Register / Login
// ============================================================================

/// Register request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Login request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Register / login response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub message: &'static str,
    pub token: String,
    pub expires_at_ms: i64,
    pub user: UserResponse,
}

// ============================================================================
// Profile
// ============================================================================

/// Public profile; never carries the credential secret
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub problems_solved: i64,
    pub solutions_provided: i64,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.user_id.into_uuid(),
            username: user.user_name.original().to_string(),
            email: user.email.as_str().to_string(),
            avatar: user.avatar,
            bio: user.bio,
            problems_solved: user.problems_solved,
            solutions_provided: user.solutions_provided,
            created_at: user.created_at,
        }
    }
}

/// Current user response
#[derive(Debug, Clone, Serialize)]
pub struct MeResponse {
    pub user: UserResponse,
}
