//! Domain Entities

use chrono::{DateTime, Utc};
use kernel::id::{ProblemId, SolutionId, UserId};
use uuid::Uuid;

use crate::domain::value_objects::{BoundedText, Category, ProblemStatus, Urgency};

/// A community problem
///
/// `upvote_count` and `solution_count` are only changed through atomic
/// deltas, never written as absolute values.
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    pub id: ProblemId,
    pub title: String,
    pub description: String,
    pub location: String,
    pub images: Vec<String>,
    pub category: Category,
    pub urgency: Urgency,
    pub status: ProblemStatus,
    pub created_by: UserId,
    pub upvote_count: i64,
    pub solution_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated fields for a new problem
#[derive(Debug, Clone)]
pub struct ProblemDraft {
    pub title: BoundedText,
    pub description: BoundedText,
    pub location: BoundedText,
    pub images: Vec<String>,
    pub category: Category,
    pub urgency: Urgency,
}

impl Problem {
    pub fn new(draft: ProblemDraft, created_by: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: ProblemId::new(),
            title: draft.title.into_inner(),
            description: draft.description.into_inner(),
            location: draft.location.into_inner(),
            images: draft.images,
            category: draft.category,
            urgency: draft.urgency,
            status: ProblemStatus::Open,
            created_by,
            upvote_count: 0,
            solution_count: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A proposed answer to a problem
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub id: SolutionId,
    pub problem_id: ProblemId,
    pub proposed_by: UserId,
    pub description: String,
    pub upvote_count: i64,
    pub comment_count: i64,
    /// Oldest first
    pub comments: Vec<Comment>,
    pub is_accepted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Solution {
    pub fn new(problem_id: ProblemId, proposed_by: UserId, description: BoundedText) -> Self {
        let now = Utc::now();
        Self {
            id: SolutionId::new(),
            problem_id,
            proposed_by,
            description: description.into_inner(),
            upvote_count: 0,
            comment_count: 0,
            comments: Vec::new(),
            is_accepted: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Comment on a solution (append-only)
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: Uuid,
    pub user_id: UserId,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(user_id: UserId, text: BoundedText) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            text: text.into_inner(),
            created_at: Utc::now(),
        }
    }
}

/// A user account as the forum sees it: public profile plus reputation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub user_id: UserId,
    pub user_name: String,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub problems_solved: i64,
    pub solutions_provided: i64,
}

impl Member {
    pub fn new(user_id: UserId, user_name: impl Into<String>) -> Self {
        Self {
            user_id,
            user_name: user_name.into(),
            avatar: None,
            bio: None,
            problems_solved: 0,
            solutions_provided: 0,
        }
    }
}

/// Outcome of the conditional accept write
#[derive(Debug, Clone, PartialEq)]
pub enum Acceptance {
    /// The solution moved from not accepted to accepted
    Transitioned(Solution),
    /// The solution was already accepted; nothing changed
    Unchanged(Solution),
}

impl Acceptance {
    pub fn transitioned(&self) -> bool {
        matches!(self, Acceptance::Transitioned(_))
    }

    pub fn into_solution(self) -> Solution {
        match self {
            Acceptance::Transitioned(s) | Acceptance::Unchanged(s) => s,
        }
    }
}
