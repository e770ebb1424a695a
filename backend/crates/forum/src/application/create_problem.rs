//! Create Problem Use Case

use std::sync::Arc;

use kernel::id::UserId;

use crate::application::config::ForumConfig;
use crate::domain::entities::{Problem, ProblemDraft};
use crate::domain::repository::ProblemRepository;
use crate::domain::services::validate_images;
use crate::domain::value_objects::{BoundedText, Category, Urgency};
use crate::error::ForumResult;

/// Input DTO for create problem (raw client values)
#[derive(Debug, Clone, Default)]
pub struct CreateProblemInput {
    pub title: String,
    pub description: String,
    pub location: String,
    pub category: String,
    pub urgency: Option<String>,
    pub images: Vec<String>,
}

/// Create Problem Use Case
pub struct CreateProblemUseCase<P>
where
    P: ProblemRepository,
{
    problem_repo: Arc<P>,
    config: Arc<ForumConfig>,
}

impl<P> CreateProblemUseCase<P>
where
    P: ProblemRepository,
{
    pub fn new(problem_repo: Arc<P>, config: Arc<ForumConfig>) -> Self {
        Self {
            problem_repo,
            config,
        }
    }

    pub async fn execute(&self, input: CreateProblemInput, author: UserId) -> ForumResult<Problem> {
        let draft = self.validate(input)?;
        let problem = Problem::new(draft, author);

        self.problem_repo.insert_problem(&problem).await?;

        tracing::info!(
            problem_id = %problem.id,
            created_by = %author,
            category = %problem.category,
            "Problem created"
        );

        Ok(problem)
    }

    fn validate(&self, input: CreateProblemInput) -> ForumResult<ProblemDraft> {
        let config = &self.config;

        Ok(ProblemDraft {
            title: BoundedText::new(&input.title, "Title", config.title_max_len)?,
            description: BoundedText::new(
                &input.description,
                "Description",
                config.description_max_len,
            )?,
            location: BoundedText::new(&input.location, "Location", config.location_max_len)?,
            category: input.category.trim().parse::<Category>()?,
            urgency: match input.urgency.as_deref().map(str::trim) {
                None | Some("") => Urgency::default(),
                Some(raw) => raw.parse()?,
            },
            images: validate_images(input.images, config.images_max, config.image_url_max_len)?,
        })
    }
}
