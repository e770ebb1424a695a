//! Read-side Use Cases
//!
//! Problem detail, problem listing and the solutions of a problem.

use std::sync::Arc;

use kernel::id::{ProblemId, UserId};

use crate::application::config::ForumConfig;
use crate::domain::entities::{Problem, Solution};
use crate::domain::repository::{
    Page, ProblemQuery, ProblemRepository, SolutionRepository, UpvoteRepository,
};
use crate::domain::services::normalize_search;
use crate::domain::value_objects::{Category, ProblemStatus, UpvoteTarget};
use crate::error::{ForumError, ForumResult};

/// Raw listing parameters as sent by the client
#[derive(Debug, Clone, Default)]
pub struct ListProblemsInput {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

/// Problem as seen by one viewer
#[derive(Debug, Clone)]
pub struct ProblemView {
    pub problem: Problem,
    /// `None` for anonymous viewers
    pub has_upvoted: Option<bool>,
}

/// Query Problems Use Case
pub struct QueryProblemsUseCase<P, S, U>
where
    P: ProblemRepository,
    S: SolutionRepository,
    U: UpvoteRepository,
{
    problem_repo: Arc<P>,
    solution_repo: Arc<S>,
    upvote_repo: Arc<U>,
    config: Arc<ForumConfig>,
}

impl<P, S, U> QueryProblemsUseCase<P, S, U>
where
    P: ProblemRepository,
    S: SolutionRepository,
    U: UpvoteRepository,
{
    pub fn new(
        problem_repo: Arc<P>,
        solution_repo: Arc<S>,
        upvote_repo: Arc<U>,
        config: Arc<ForumConfig>,
    ) -> Self {
        Self {
            problem_repo,
            solution_repo,
            upvote_repo,
            config,
        }
    }

    pub async fn get(
        &self,
        problem_id: ProblemId,
        viewer: Option<UserId>,
    ) -> ForumResult<ProblemView> {
        let problem = self
            .problem_repo
            .get_problem(&problem_id)
            .await?
            .ok_or(ForumError::ProblemNotFound)?;

        let has_upvoted = match viewer {
            Some(user_id) => Some(
                self.upvote_repo
                    .has_upvote(UpvoteTarget::Problem(problem.id), &user_id)
                    .await?,
            ),
            None => None,
        };

        Ok(ProblemView {
            problem,
            has_upvoted,
        })
    }

    pub async fn list(&self, input: ListProblemsInput) -> ForumResult<Page<Problem>> {
        let (page, limit) = self.config.page_window(input.page, input.limit);

        let query = ProblemQuery {
            category: non_blank(input.category)
                .map(|c| c.parse::<Category>())
                .transpose()?,
            status: non_blank(input.status)
                .map(|s| s.parse::<ProblemStatus>())
                .transpose()?,
            search: normalize_search(input.search.as_deref()),
            page,
            limit,
        };

        self.problem_repo.search_problems(&query).await
    }

    pub async fn solutions(&self, problem_id: ProblemId) -> ForumResult<Vec<Solution>> {
        if self.problem_repo.get_problem(&problem_id).await?.is_none() {
            return Err(ForumError::ProblemNotFound);
        }

        self.solution_repo.list_solutions(&problem_id).await
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
