//! Submit Solution Use Case
//!
//! The solution is persisted first and is the durable fact. The problem's
//! solution counter and the author's reputation follow as independent
//! atomic deltas; a failure there is logged as counter drift and does not
//! undo the submission.

use std::sync::Arc;

use kernel::id::{ProblemId, UserId};

use crate::application::config::ForumConfig;
use crate::domain::entities::Solution;
use crate::domain::repository::{MemberRepository, ProblemRepository, SolutionRepository};
use crate::domain::value_objects::{BoundedText, Delta, ProblemCounter, ReputationCounter};
use crate::error::{ForumError, ForumResult};

/// Input DTO for submit solution
#[derive(Debug, Clone)]
pub struct SubmitSolutionInput {
    pub problem_id: ProblemId,
    pub description: String,
}

/// Submit Solution Use Case
pub struct SubmitSolutionUseCase<P, S, M>
where
    P: ProblemRepository,
    S: SolutionRepository,
    M: MemberRepository,
{
    problem_repo: Arc<P>,
    solution_repo: Arc<S>,
    member_repo: Arc<M>,
    config: Arc<ForumConfig>,
}

impl<P, S, M> SubmitSolutionUseCase<P, S, M>
where
    P: ProblemRepository,
    S: SolutionRepository,
    M: MemberRepository,
{
    pub fn new(
        problem_repo: Arc<P>,
        solution_repo: Arc<S>,
        member_repo: Arc<M>,
        config: Arc<ForumConfig>,
    ) -> Self {
        Self {
            problem_repo,
            solution_repo,
            member_repo,
            config,
        }
    }

    pub async fn execute(
        &self,
        input: SubmitSolutionInput,
        author: UserId,
    ) -> ForumResult<Solution> {
        let description = BoundedText::new(
            &input.description,
            "Description",
            self.config.description_max_len,
        )?;

        let problem = self
            .problem_repo
            .get_problem(&input.problem_id)
            .await?
            .ok_or(ForumError::ProblemNotFound)?;

        let solution = Solution::new(problem.id, author, description);
        self.solution_repo.insert_solution(&solution).await?;

        tracing::info!(
            solution_id = %solution.id,
            problem_id = %problem.id,
            proposed_by = %author,
            "Solution submitted"
        );

        if let Err(e) = self
            .problem_repo
            .apply_problem_delta(&problem.id, ProblemCounter::Solutions, Delta::Increment)
            .await
        {
            tracing::error!(
                error = %e,
                problem_id = %problem.id,
                solution_id = %solution.id,
                "Solution counter drift: increment failed"
            );
        }

        if let Err(e) = self
            .member_repo
            .apply_member_delta(&author, ReputationCounter::SolutionsProvided, Delta::Increment)
            .await
        {
            tracing::error!(
                error = %e,
                user_id = %author,
                solution_id = %solution.id,
                "Reputation drift: solutions_provided increment failed"
            );
        }

        Ok(solution)
    }
}
