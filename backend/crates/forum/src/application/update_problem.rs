//! Update Problem Use Case
//!
//! Owner-only edit of descriptive fields and manual status moves. The
//! status write is conditional on the status that was read, so an edit
//! racing with an acceptance fails instead of silently reopening.

use std::sync::Arc;

use kernel::id::{ProblemId, UserId};

use crate::application::config::ForumConfig;
use crate::domain::entities::Problem;
use crate::domain::repository::{ProblemChanges, ProblemRepository};
use crate::domain::services::{require_owner, validate_images};
use crate::domain::value_objects::{BoundedText, Category, ProblemStatus, Urgency};
use crate::error::{ForumError, ForumResult};

/// Input DTO for update problem; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct UpdateProblemInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub urgency: Option<String>,
    pub status: Option<String>,
    pub images: Option<Vec<String>>,
}

/// Update Problem Use Case
pub struct UpdateProblemUseCase<P>
where
    P: ProblemRepository,
{
    problem_repo: Arc<P>,
    config: Arc<ForumConfig>,
}

impl<P> UpdateProblemUseCase<P>
where
    P: ProblemRepository,
{
    pub fn new(problem_repo: Arc<P>, config: Arc<ForumConfig>) -> Self {
        Self {
            problem_repo,
            config,
        }
    }

    pub async fn execute(
        &self,
        problem_id: ProblemId,
        input: UpdateProblemInput,
        acting_user: UserId,
    ) -> ForumResult<Problem> {
        let problem = self
            .problem_repo
            .get_problem(&problem_id)
            .await?
            .ok_or(ForumError::ProblemNotFound)?;

        require_owner(&problem.created_by, &acting_user, "edit this problem")?;

        let changes = self.validate(input, problem.status)?;
        if changes.is_empty() {
            return Ok(problem);
        }

        let expected_status = changes.status.map(|_| problem.status);
        let updated = self
            .problem_repo
            .set_problem_fields(&problem.id, &changes, expected_status)
            .await?;

        tracing::info!(
            problem_id = %updated.id,
            status = %updated.status,
            "Problem updated"
        );

        Ok(updated)
    }

    fn validate(
        &self,
        input: UpdateProblemInput,
        current: ProblemStatus,
    ) -> ForumResult<ProblemChanges> {
        let config = &self.config;

        let status = match input.status {
            Some(raw) => {
                let next = raw.trim().parse::<ProblemStatus>()?;
                current.check_manual_transition(next)?;
                (next != current).then_some(next)
            }
            None => None,
        };

        Ok(ProblemChanges {
            title: input
                .title
                .map(|t| BoundedText::new(&t, "Title", config.title_max_len))
                .transpose()?
                .map(BoundedText::into_inner),
            description: input
                .description
                .map(|d| BoundedText::new(&d, "Description", config.description_max_len))
                .transpose()?
                .map(BoundedText::into_inner),
            location: input
                .location
                .map(|l| BoundedText::new(&l, "Location", config.location_max_len))
                .transpose()?
                .map(BoundedText::into_inner),
            images: input
                .images
                .map(|i| validate_images(i, config.images_max, config.image_url_max_len))
                .transpose()?,
            category: input
                .category
                .map(|c| c.trim().parse::<Category>())
                .transpose()?,
            urgency: input
                .urgency
                .map(|u| u.trim().parse::<Urgency>())
                .transpose()?,
            status,
        })
    }
}
