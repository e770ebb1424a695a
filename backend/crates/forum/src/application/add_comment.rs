//! Add Comment Use Case

use std::sync::Arc;

use kernel::id::{SolutionId, UserId};

use crate::application::config::ForumConfig;
use crate::domain::entities::Comment;
use crate::domain::repository::SolutionRepository;
use crate::domain::value_objects::{BoundedText, Delta, SolutionCounter};
use crate::error::{ForumError, ForumResult};

/// Output DTO for add comment
#[derive(Debug, Clone)]
pub struct AddCommentOutput {
    pub comment: Comment,
    pub comment_count: i64,
}

/// Add Comment Use Case
pub struct AddCommentUseCase<S>
where
    S: SolutionRepository,
{
    solution_repo: Arc<S>,
    config: Arc<ForumConfig>,
}

impl<S> AddCommentUseCase<S>
where
    S: SolutionRepository,
{
    pub fn new(solution_repo: Arc<S>, config: Arc<ForumConfig>) -> Self {
        Self {
            solution_repo,
            config,
        }
    }

    pub async fn execute(
        &self,
        solution_id: SolutionId,
        author: UserId,
        text: &str,
    ) -> ForumResult<AddCommentOutput> {
        let text = BoundedText::new(text, "Comment", self.config.comment_max_len)?;

        if self.solution_repo.get_solution(&solution_id).await?.is_none() {
            return Err(ForumError::SolutionNotFound);
        }

        let comment = Comment::new(author, text);
        self.solution_repo
            .append_comment(&solution_id, &comment)
            .await?;

        let solution = self
            .solution_repo
            .apply_solution_delta(&solution_id, SolutionCounter::Comments, Delta::Increment)
            .await?;

        tracing::info!(
            solution_id = %solution_id,
            comment_id = %comment.id,
            user_id = %author,
            "Comment added"
        );

        Ok(AddCommentOutput {
            comment,
            comment_count: solution.comment_count,
        })
    }
}
