//! Toggle Upvote Use Case
//!
//! Membership in the upvote set is the source of truth. Each set change
//! moves the counter in the same atomic store operation, so concurrent
//! toggles never lose updates, a user is never counted twice and the count
//! cannot drift from the set.

use std::sync::Arc;

use kernel::id::UserId;

use crate::domain::repository::UpvoteRepository;
use crate::domain::value_objects::UpvoteTarget;
use crate::error::ForumResult;

/// Output DTO for toggle upvote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleUpvoteOutput {
    pub upvote_count: i64,
    pub has_upvoted: bool,
}

/// Toggle Upvote Use Case
pub struct ToggleUpvoteUseCase<U>
where
    U: UpvoteRepository,
{
    upvote_repo: Arc<U>,
}

impl<U> ToggleUpvoteUseCase<U>
where
    U: UpvoteRepository,
{
    pub fn new(upvote_repo: Arc<U>) -> Self {
        Self { upvote_repo }
    }

    pub async fn execute(
        &self,
        target: UpvoteTarget,
        user_id: UserId,
    ) -> ForumResult<ToggleUpvoteOutput> {
        // NotFound before anything is written
        let had_upvoted = self.upvote_repo.has_upvote(target, &user_id).await?;

        let change = if had_upvoted {
            self.upvote_repo.remove_upvote(target, &user_id).await?
        } else {
            self.upvote_repo.add_upvote(target, &user_id).await?
        };
        let has_upvoted = !had_upvoted;

        if change.changed {
            tracing::info!(
                upvote_target = %target,
                user_id = %user_id,
                upvote_count = change.upvote_count,
                has_upvoted,
                "Upvote toggled"
            );
        } else {
            // A concurrent toggle by the same user got there first
            tracing::debug!(
                upvote_target = %target,
                user_id = %user_id,
                has_upvoted,
                "Upvote already in requested state"
            );
        }

        Ok(ToggleUpvoteOutput {
            upvote_count: change.upvote_count,
            has_upvoted,
        })
    }
}
