//! Register Use Case
//!
//! Creates a new user account and signs the first principal token.

use std::sync::Arc;

use platform::password::ClearTextPassword;

use crate::application::config::IdentityConfig;
use crate::application::principal_token::{self, IssuedToken};
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{email::Email, user_name::UserName};
use crate::error::{IdentityError, IdentityResult};

/// Register input
pub struct RegisterInput {
    pub user_name: String,
    pub email: String,
    pub password: String,
}

/// Register output
pub struct RegisterOutput {
    pub user: User,
    pub token: IssuedToken,
}

/// Register use case
pub struct RegisterUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    config: Arc<IdentityConfig>,
}

impl<U> RegisterUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>, config: Arc<IdentityConfig>) -> Self {
        Self { user_repo, config }
    }

    pub async fn execute(&self, input: RegisterInput) -> IdentityResult<RegisterOutput> {
        let user_name = UserName::new(&input.user_name)
            .map_err(|e| IdentityError::Validation(e.to_string()))?;
        let email = Email::new(&input.email)?;

        let password = ClearTextPassword::new(input.password)
            .map_err(|e| IdentityError::PasswordValidation(e.to_string()))?;

        if self.user_repo.exists_by_user_name(&user_name).await? {
            return Err(IdentityError::UserNameTaken);
        }
        if self.user_repo.exists_by_email(&email).await? {
            return Err(IdentityError::EmailTaken);
        }

        let password_hash = password
            .hash(self.config.pepper())
            .map_err(|e| IdentityError::Internal(e.to_string()))?;

        let user = User::new(user_name, email, password_hash);

        // The store re-checks uniqueness atomically
        self.user_repo.create(&user).await?;

        tracing::info!(
            user_id = %user.user_id,
            user_name = %user.user_name,
            "User registered"
        );

        let token = principal_token::issue(&self.config, user.user_id);

        Ok(RegisterOutput { user, token })
    }
}
