//! In-Memory Repository Implementation
//!
//! Every call runs inside one critical section of a single `RwLock`, which
//! gives the same per-call atomicity the PostgreSQL store provides. Used by
//! tests and local runs without a database.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use kernel::id::{ProblemId, SolutionId, UserId};
use parking_lot::RwLock;

use crate::domain::entities::{Acceptance, Comment, Member, Problem, Solution};
use crate::domain::repository::{
    MemberRepository, Page, ProblemChanges, ProblemQuery, ProblemRepository, SolutionRepository,
    UpvoteChange, UpvoteRepository,
};
use crate::domain::value_objects::{
    Delta, ProblemCounter, ProblemStatus, ReputationCounter, SolutionCounter, UpvoteTarget,
};
use crate::error::{ForumError, ForumResult};

#[derive(Default)]
struct Collections {
    problems: HashMap<ProblemId, Problem>,
    solutions: HashMap<SolutionId, Solution>,
    problem_upvotes: HashSet<(ProblemId, UserId)>,
    solution_upvotes: HashSet<(SolutionId, UserId)>,
    members: HashMap<UserId, Member>,
}

impl Collections {
    fn target_exists(&self, target: UpvoteTarget) -> bool {
        match target {
            UpvoteTarget::Problem(id) => self.problems.contains_key(&id),
            UpvoteTarget::Solution(id) => self.solutions.contains_key(&id),
        }
    }

    /// Move the user in or out of the set and the counter with it
    fn change_upvote(
        &mut self,
        target: UpvoteTarget,
        user_id: &UserId,
        delta: Delta,
    ) -> ForumResult<UpvoteChange> {
        let (changed, slot) = match target {
            UpvoteTarget::Problem(id) => {
                let problem = self
                    .problems
                    .get_mut(&id)
                    .ok_or(ForumError::ProblemNotFound)?;
                let changed = match delta {
                    Delta::Increment => self.problem_upvotes.insert((id, *user_id)),
                    Delta::Decrement => self.problem_upvotes.remove(&(id, *user_id)),
                };
                (changed, &mut problem.upvote_count)
            }
            UpvoteTarget::Solution(id) => {
                let solution = self
                    .solutions
                    .get_mut(&id)
                    .ok_or(ForumError::SolutionNotFound)?;
                let changed = match delta {
                    Delta::Increment => self.solution_upvotes.insert((id, *user_id)),
                    Delta::Decrement => self.solution_upvotes.remove(&(id, *user_id)),
                };
                (changed, &mut solution.upvote_count)
            }
        };

        if changed {
            *slot = delta.apply(*slot)?;
        }

        Ok(UpvoteChange {
            upvote_count: *slot,
            changed,
        })
    }
}

/// Thread-safe in-memory forum store
#[derive(Clone, Default)]
pub struct MemoryForumStore {
    inner: Arc<RwLock<Collections>>,
}

impl MemoryForumStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user account so it can author content and earn reputation
    pub fn insert_member(&self, user_id: UserId, user_name: &str) -> Member {
        self.inner
            .write()
            .members
            .entry(user_id)
            .or_insert_with(|| Member::new(user_id, user_name))
            .clone()
    }
}

impl ProblemRepository for MemoryForumStore {
    async fn insert_problem(&self, problem: &Problem) -> ForumResult<()> {
        self.inner
            .write()
            .problems
            .insert(problem.id, problem.clone());
        Ok(())
    }

    async fn get_problem(&self, id: &ProblemId) -> ForumResult<Option<Problem>> {
        Ok(self.inner.read().problems.get(id).cloned())
    }

    async fn search_problems(&self, query: &ProblemQuery) -> ForumResult<Page<Problem>> {
        let needle = query.search.as_ref().map(|s| s.to_lowercase());

        let mut matches: Vec<Problem> = self
            .inner
            .read()
            .problems
            .values()
            .filter(|p| query.category.is_none_or(|c| p.category == c))
            .filter(|p| query.status.is_none_or(|s| p.status == s))
            .filter(|p| {
                needle.as_ref().is_none_or(|n| {
                    p.title.to_lowercase().contains(n)
                        || p.description.to_lowercase().contains(n)
                        || p.location.to_lowercase().contains(n)
                })
            })
            .cloned()
            .collect();

        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matches.len() as u64;
        let items = matches
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit as usize)
            .collect();

        Ok(Page {
            items,
            total,
            page: query.page,
            limit: query.limit,
        })
    }

    async fn apply_problem_delta(
        &self,
        id: &ProblemId,
        counter: ProblemCounter,
        delta: Delta,
    ) -> ForumResult<Problem> {
        let mut inner = self.inner.write();
        let problem = inner
            .problems
            .get_mut(id)
            .ok_or(ForumError::ProblemNotFound)?;

        let slot = match counter {
            ProblemCounter::Solutions => &mut problem.solution_count,
        };
        *slot = delta.apply(*slot)?;

        Ok(problem.clone())
    }

    async fn set_problem_fields(
        &self,
        id: &ProblemId,
        changes: &ProblemChanges,
        expected_status: Option<ProblemStatus>,
    ) -> ForumResult<Problem> {
        let mut inner = self.inner.write();
        let problem = inner
            .problems
            .get_mut(id)
            .ok_or(ForumError::ProblemNotFound)?;

        if expected_status.is_some_and(|expected| problem.status != expected) {
            return Err(ForumError::precondition_failed(
                "Problem status changed concurrently",
            ));
        }

        if let Some(title) = &changes.title {
            problem.title = title.clone();
        }
        if let Some(description) = &changes.description {
            problem.description = description.clone();
        }
        if let Some(location) = &changes.location {
            problem.location = location.clone();
        }
        if let Some(images) = &changes.images {
            problem.images = images.clone();
        }
        if let Some(category) = changes.category {
            problem.category = category;
        }
        if let Some(urgency) = changes.urgency {
            problem.urgency = urgency;
        }
        if let Some(status) = changes.status {
            problem.status = status;
        }
        problem.updated_at = Utc::now();

        Ok(problem.clone())
    }
}

impl SolutionRepository for MemoryForumStore {
    async fn insert_solution(&self, solution: &Solution) -> ForumResult<()> {
        let mut inner = self.inner.write();
        if !inner.problems.contains_key(&solution.problem_id) {
            return Err(ForumError::ProblemNotFound);
        }
        inner.solutions.insert(solution.id, solution.clone());
        Ok(())
    }

    async fn get_solution(&self, id: &SolutionId) -> ForumResult<Option<Solution>> {
        Ok(self.inner.read().solutions.get(id).cloned())
    }

    async fn list_solutions(&self, problem_id: &ProblemId) -> ForumResult<Vec<Solution>> {
        let mut solutions: Vec<Solution> = self
            .inner
            .read()
            .solutions
            .values()
            .filter(|s| s.problem_id == *problem_id)
            .cloned()
            .collect();

        solutions.sort_by(|a, b| {
            b.upvote_count
                .cmp(&a.upvote_count)
                .then(b.created_at.cmp(&a.created_at))
        });

        Ok(solutions)
    }

    async fn apply_solution_delta(
        &self,
        id: &SolutionId,
        counter: SolutionCounter,
        delta: Delta,
    ) -> ForumResult<Solution> {
        let mut inner = self.inner.write();
        let solution = inner
            .solutions
            .get_mut(id)
            .ok_or(ForumError::SolutionNotFound)?;

        let slot = match counter {
            SolutionCounter::Comments => &mut solution.comment_count,
        };
        *slot = delta.apply(*slot)?;

        Ok(solution.clone())
    }

    async fn append_comment(&self, id: &SolutionId, comment: &Comment) -> ForumResult<()> {
        let mut inner = self.inner.write();
        let solution = inner
            .solutions
            .get_mut(id)
            .ok_or(ForumError::SolutionNotFound)?;

        solution.comments.push(comment.clone());
        Ok(())
    }

    async fn clear_accepted_except(
        &self,
        problem_id: &ProblemId,
        keep: &SolutionId,
    ) -> ForumResult<u64> {
        let mut inner = self.inner.write();
        let now = Utc::now();
        let mut demoted = 0;

        for solution in inner.solutions.values_mut() {
            if solution.problem_id == *problem_id && solution.id != *keep && solution.is_accepted {
                solution.is_accepted = false;
                solution.updated_at = now;
                demoted += 1;
            }
        }

        Ok(demoted)
    }

    async fn mark_accepted(&self, id: &SolutionId) -> ForumResult<Acceptance> {
        let mut inner = self.inner.write();

        let (problem_id, already_accepted) = inner
            .solutions
            .get(id)
            .map(|s| (s.problem_id, s.is_accepted))
            .ok_or(ForumError::SolutionNotFound)?;

        if already_accepted {
            let solution = inner.solutions[id].clone();
            return Ok(Acceptance::Unchanged(solution));
        }

        let rival = inner
            .solutions
            .values()
            .any(|s| s.problem_id == problem_id && s.id != *id && s.is_accepted);
        if rival {
            return Err(ForumError::precondition_failed(
                "Another solution was accepted concurrently",
            ));
        }

        let solution = inner
            .solutions
            .get_mut(id)
            .ok_or(ForumError::SolutionNotFound)?;
        solution.is_accepted = true;
        solution.updated_at = Utc::now();

        Ok(Acceptance::Transitioned(solution.clone()))
    }
}

impl UpvoteRepository for MemoryForumStore {
    async fn has_upvote(&self, target: UpvoteTarget, user_id: &UserId) -> ForumResult<bool> {
        let inner = self.inner.read();
        if !inner.target_exists(target) {
            return Err(target.not_found());
        }

        Ok(match target {
            UpvoteTarget::Problem(id) => inner.problem_upvotes.contains(&(id, *user_id)),
            UpvoteTarget::Solution(id) => inner.solution_upvotes.contains(&(id, *user_id)),
        })
    }

    async fn add_upvote(
        &self,
        target: UpvoteTarget,
        user_id: &UserId,
    ) -> ForumResult<UpvoteChange> {
        self.inner.write().change_upvote(target, user_id, Delta::Increment)
    }

    async fn remove_upvote(
        &self,
        target: UpvoteTarget,
        user_id: &UserId,
    ) -> ForumResult<UpvoteChange> {
        self.inner.write().change_upvote(target, user_id, Delta::Decrement)
    }
}

impl MemberRepository for MemoryForumStore {
    async fn get_member(&self, user_id: &UserId) -> ForumResult<Option<Member>> {
        Ok(self.inner.read().members.get(user_id).cloned())
    }

    async fn find_members(&self, user_ids: &[UserId]) -> ForumResult<Vec<Member>> {
        let inner = self.inner.read();
        Ok(user_ids
            .iter()
            .filter_map(|id| inner.members.get(id).cloned())
            .collect())
    }

    async fn apply_member_delta(
        &self,
        user_id: &UserId,
        counter: ReputationCounter,
        delta: Delta,
    ) -> ForumResult<Member> {
        let mut inner = self.inner.write();
        let member = inner
            .members
            .get_mut(user_id)
            .ok_or(ForumError::UserNotFound)?;

        let slot = match counter {
            ReputationCounter::ProblemsSolved => &mut member.problems_solved,
            ReputationCounter::SolutionsProvided => &mut member.solutions_provided,
        };
        *slot = delta.apply(*slot)?;

        Ok(member.clone())
    }
}
