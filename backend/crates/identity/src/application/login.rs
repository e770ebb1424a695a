//! Login Use Case
//!
//! Verifies email + password and signs a principal token.

use std::sync::Arc;

use platform::password::ClearTextPassword;

use crate::application::config::IdentityConfig;
use crate::application::principal_token::{self, IssuedToken};
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::email::Email;
use crate::error::{IdentityError, IdentityResult};

/// Login input
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Login output
pub struct LoginOutput {
    pub user: User,
    pub token: IssuedToken,
}

/// Login use case
pub struct LoginUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    config: Arc<IdentityConfig>,
}

impl<U> LoginUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>, config: Arc<IdentityConfig>) -> Self {
        Self { user_repo, config }
    }

    /// Every failure mode returns `InvalidCredentials`
    pub async fn execute(&self, input: LoginInput) -> IdentityResult<LoginOutput> {
        let email = Email::new(&input.email).map_err(|_| IdentityError::InvalidCredentials)?;

        let user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or(IdentityError::InvalidCredentials)?;

        let password = ClearTextPassword::for_verification(input.password);
        if !user.password_hash.verify(&password, self.config.pepper()) {
            tracing::warn!(user_id = %user.user_id, "Password mismatch on login");
            return Err(IdentityError::InvalidCredentials);
        }

        tracing::info!(user_id = %user.user_id, "User logged in");

        let token = principal_token::issue(&self.config, user.user_id);

        Ok(LoginOutput { user, token })
    }
}
