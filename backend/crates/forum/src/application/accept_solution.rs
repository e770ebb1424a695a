//! Accept Solution Use Case
//!
//! Sequence, each step atomic on its own:
//! 1. load solution and problem
//! 2. owner check (nothing written on failure)
//! 3. demote every other accepted solution of the problem
//! 4. conditionally accept this one (`PreconditionFailed` if another won)
//! 5. mark the problem resolved
//! 6. credit the proposer, only if step 4 was a real transition
//!
//! Re-running after a partial failure converges and never credits twice.

use std::sync::Arc;

use kernel::id::{SolutionId, UserId};

use crate::domain::entities::Solution;
use crate::domain::repository::{
    MemberRepository, ProblemChanges, ProblemRepository, SolutionRepository,
};
use crate::domain::services::require_owner;
use crate::domain::value_objects::{Delta, ProblemStatus, ReputationCounter};
use crate::error::{ForumError, ForumResult};

/// Output DTO for accept solution
#[derive(Debug, Clone)]
pub struct AcceptSolutionOutput {
    pub solution: Solution,
    pub problem_status: ProblemStatus,
    /// Previously accepted solutions that were demoted
    pub demoted: u64,
    /// False when the solution was already accepted
    pub newly_accepted: bool,
}

/// Accept Solution Use Case
pub struct AcceptSolutionUseCase<P, S, M>
where
    P: ProblemRepository,
    S: SolutionRepository,
    M: MemberRepository,
{
    problem_repo: Arc<P>,
    solution_repo: Arc<S>,
    member_repo: Arc<M>,
}

impl<P, S, M> AcceptSolutionUseCase<P, S, M>
where
    P: ProblemRepository,
    S: SolutionRepository,
    M: MemberRepository,
{
    pub fn new(problem_repo: Arc<P>, solution_repo: Arc<S>, member_repo: Arc<M>) -> Self {
        Self {
            problem_repo,
            solution_repo,
            member_repo,
        }
    }

    pub async fn execute(
        &self,
        solution_id: SolutionId,
        acting_user: UserId,
    ) -> ForumResult<AcceptSolutionOutput> {
        let solution = self
            .solution_repo
            .get_solution(&solution_id)
            .await?
            .ok_or(ForumError::SolutionNotFound)?;

        let problem = self
            .problem_repo
            .get_problem(&solution.problem_id)
            .await?
            .ok_or_else(|| {
                ForumError::Internal(format!(
                    "solution {} references missing problem {}",
                    solution.id, solution.problem_id
                ))
            })?;

        require_owner(&problem.created_by, &acting_user, "accept a solution")?;

        let demoted = self
            .solution_repo
            .clear_accepted_except(&problem.id, &solution.id)
            .await?;
        if demoted > 1 {
            tracing::warn!(
                problem_id = %problem.id,
                demoted,
                "Found more than one accepted solution; repaired"
            );
        }

        let acceptance = self.solution_repo.mark_accepted(&solution.id).await?;
        let newly_accepted = acceptance.transitioned();
        let solution = acceptance.into_solution();

        let problem = self
            .problem_repo
            .set_problem_fields(
                &problem.id,
                &ProblemChanges::status(ProblemStatus::Resolved),
                None,
            )
            .await?;

        if newly_accepted {
            if let Err(e) = self
                .member_repo
                .apply_member_delta(
                    &solution.proposed_by,
                    ReputationCounter::ProblemsSolved,
                    Delta::Increment,
                )
                .await
            {
                tracing::error!(
                    error = %e,
                    user_id = %solution.proposed_by,
                    solution_id = %solution.id,
                    "Reputation drift: problems_solved increment failed"
                );
            }
        }

        tracing::info!(
            solution_id = %solution.id,
            problem_id = %problem.id,
            demoted,
            newly_accepted,
            "Solution accepted"
        );

        Ok(AcceptSolutionOutput {
            solution,
            problem_status: problem.status,
            demoted,
            newly_accepted,
        })
    }
}
