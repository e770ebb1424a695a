//! Current User Use Case

use std::sync::Arc;

use kernel::id::UserId;

use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::error::{IdentityError, IdentityResult};

/// Loads the profile of the acting principal
pub struct MeUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
}

impl<U> MeUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }

    pub async fn execute(&self, user_id: UserId) -> IdentityResult<User> {
        self.user_repo
            .find_by_id(&user_id)
            .await?
            .ok_or(IdentityError::UserNotFound)
    }
}
