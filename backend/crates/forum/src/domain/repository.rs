//! Repository Traits
//!
//! The store contract the workflows rely on. Every method is atomic on its
//! own; nothing here spans more than one document unless stated.

use kernel::id::{ProblemId, SolutionId, UserId};

use crate::domain::entities::{Acceptance, Comment, Member, Problem, Solution};
use crate::domain::value_objects::{
    Category, Delta, ProblemCounter, ProblemStatus, ReputationCounter, SolutionCounter,
    UpvoteTarget, Urgency,
};
use crate::error::ForumResult;

/// Filters and paging for problem listings (newest first)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProblemQuery {
    pub category: Option<Category>,
    pub status: Option<ProblemStatus>,
    /// Case-insensitive substring of title, description or location
    pub search: Option<String>,
    /// 1-based
    pub page: u32,
    pub limit: u32,
}

impl ProblemQuery {
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u64 {
        if self.limit == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.limit))
    }
}

/// Editable problem fields; `None` leaves the field untouched
///
/// Counters are deliberately absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProblemChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub images: Option<Vec<String>>,
    pub category: Option<Category>,
    pub urgency: Option<Urgency>,
    pub status: Option<ProblemStatus>,
}

impl ProblemChanges {
    pub fn status(status: ProblemStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Problem persistence
#[trait_variant::make(ProblemRepository: Send)]
pub trait LocalProblemRepository {
    async fn insert_problem(&self, problem: &Problem) -> ForumResult<()>;

    async fn get_problem(&self, id: &ProblemId) -> ForumResult<Option<Problem>>;

    async fn search_problems(&self, query: &ProblemQuery) -> ForumResult<Page<Problem>>;

    /// Atomically add `delta` to one counter
    ///
    /// Fails with `ProblemNotFound` if the problem does not exist.
    async fn apply_problem_delta(
        &self,
        id: &ProblemId,
        counter: ProblemCounter,
        delta: Delta,
    ) -> ForumResult<Problem>;

    /// Write the given fields
    ///
    /// With `expected_status` set, the write only happens while the stored
    /// status still equals it; otherwise `PreconditionFailed`.
    async fn set_problem_fields(
        &self,
        id: &ProblemId,
        changes: &ProblemChanges,
        expected_status: Option<ProblemStatus>,
    ) -> ForumResult<Problem>;
}

/// Solution persistence, including comments and acceptance
#[trait_variant::make(SolutionRepository: Send)]
pub trait LocalSolutionRepository {
    async fn insert_solution(&self, solution: &Solution) -> ForumResult<()>;

    /// Load a solution with its comments
    async fn get_solution(&self, id: &SolutionId) -> ForumResult<Option<Solution>>;

    /// All solutions of a problem, most upvoted first, then newest first
    async fn list_solutions(&self, problem_id: &ProblemId) -> ForumResult<Vec<Solution>>;

    /// Atomically add `delta` to one counter
    async fn apply_solution_delta(
        &self,
        id: &SolutionId,
        counter: SolutionCounter,
        delta: Delta,
    ) -> ForumResult<Solution>;

    /// Append to the comment set; the comment counter is a separate delta
    async fn append_comment(&self, id: &SolutionId, comment: &Comment) -> ForumResult<()>;

    /// Set `is_accepted = false` on every accepted solution of the problem
    /// except `keep`; returns how many were demoted
    async fn clear_accepted_except(
        &self,
        problem_id: &ProblemId,
        keep: &SolutionId,
    ) -> ForumResult<u64>;

    /// Set `is_accepted = true` unless another solution of the same problem
    /// is accepted, in which case `PreconditionFailed`
    async fn mark_accepted(&self, id: &SolutionId) -> ForumResult<Acceptance>;
}

/// Outcome of one upvoter set change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpvoteChange {
    /// Counter value written in the same atomic step as the set change
    pub upvote_count: i64,
    /// `false` when the user was already in the requested state
    pub changed: bool,
}

/// Per-user upvote sets, one per target
///
/// The set and the target's `upvote_count` change together or not at all,
/// so the count always equals the set's cardinality. Every method fails with
/// the target's NotFound error if the target does not exist.
#[trait_variant::make(UpvoteRepository: Send)]
pub trait LocalUpvoteRepository {
    async fn has_upvote(&self, target: UpvoteTarget, user_id: &UserId) -> ForumResult<bool>;

    /// Insert into the set and increment the counter if the insert happened
    async fn add_upvote(
        &self,
        target: UpvoteTarget,
        user_id: &UserId,
    ) -> ForumResult<UpvoteChange>;

    /// Remove from the set and decrement the counter if the removal happened
    async fn remove_upvote(
        &self,
        target: UpvoteTarget,
        user_id: &UserId,
    ) -> ForumResult<UpvoteChange>;
}

/// User accounts: public profile reads and reputation counters
#[trait_variant::make(MemberRepository: Send)]
pub trait LocalMemberRepository {
    async fn get_member(&self, user_id: &UserId) -> ForumResult<Option<Member>>;

    /// Profiles for the given accounts; unknown ids are skipped
    async fn find_members(&self, user_ids: &[UserId]) -> ForumResult<Vec<Member>>;

    /// Fails with `UserNotFound` if the account does not exist
    async fn apply_member_delta(
        &self,
        user_id: &UserId,
        counter: ReputationCounter,
        delta: Delta,
    ) -> ForumResult<Member>;
}

/// Everything the HTTP layer needs from one backing store
pub trait ForumStore:
    ProblemRepository
    + SolutionRepository
    + UpvoteRepository
    + MemberRepository
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> ForumStore for T where
    T: ProblemRepository
        + SolutionRepository
        + UpvoteRepository
        + MemberRepository
        + Clone
        + Send
        + Sync
        + 'static
{
}
