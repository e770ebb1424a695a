//! Domain Value Objects
//!
//! Closed vocabularies, counter names and validated text for the forum domain.

use std::fmt;
use std::str::FromStr;

use kernel::id::{ProblemId, SolutionId};
use serde::{Deserialize, Serialize};

use crate::error::{ForumError, ForumResult};

/// Declares a closed string vocabulary with its wire names.
macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal {
            $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $wire)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub const fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl FromStr for $name {
            type Err = ForumError;

            fn from_str(s: &str) -> ForumResult<Self> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => Err(ForumError::validation(format!(
                        "Invalid {} '{}'",
                        $label, other
                    ))),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

vocabulary! {
    /// What area of community life a problem concerns
    Category, "category" {
        Environment => "environment",
        Infrastructure => "infrastructure",
        Social => "social",
        Education => "education",
        Health => "health",
        Other => "other",
    }
}

vocabulary! {
    Urgency, "urgency" {
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
}

vocabulary! {
    /// Problem lifecycle
    ///
    /// `Resolved` is reached only by accepting a solution. A resolved problem
    /// can still be closed by its owner but never reopened by hand.
    ProblemStatus, "status" {
        Open => "open",
        InProgress => "in-progress",
        Resolved => "resolved",
        Closed => "closed",
    }
}

impl Default for Urgency {
    fn default() -> Self {
        Urgency::Medium
    }
}

impl Default for ProblemStatus {
    fn default() -> Self {
        ProblemStatus::Open
    }
}

impl ProblemStatus {
    /// Whether an owner may move a problem from `self` to `next` by editing it
    pub fn check_manual_transition(self, next: ProblemStatus) -> ForumResult<()> {
        if next == self {
            return Ok(());
        }
        match (self, next) {
            (_, ProblemStatus::Resolved) => Err(ForumError::validation(
                "Status 'resolved' is set by accepting a solution",
            )),
            (ProblemStatus::Resolved, ProblemStatus::Closed) => Ok(()),
            (ProblemStatus::Resolved, _) => Err(ForumError::validation(
                "A resolved problem can only be closed",
            )),
            _ => Ok(()),
        }
    }
}

/// Direction of an atomic counter change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delta {
    Increment,
    Decrement,
}

impl Delta {
    pub const fn value(self) -> i64 {
        match self {
            Delta::Increment => 1,
            Delta::Decrement => -1,
        }
    }

    /// Apply to a stored count
    ///
    /// Counts never go below zero; a decrement past it means the counter and
    /// the data it counts have diverged, which is an internal error.
    pub fn apply(self, count: i64) -> ForumResult<i64> {
        let next = count + self.value();
        if next < 0 {
            return Err(ForumError::Internal(format!(
                "counter would drop below zero (at {})",
                count
            )));
        }
        Ok(next)
    }
}

/// Counters kept on a problem
///
/// The upvote counter is absent: it only moves together with the upvoter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemCounter {
    Solutions,
}

impl ProblemCounter {
    pub const fn column(self) -> &'static str {
        match self {
            ProblemCounter::Solutions => "solution_count",
        }
    }
}

/// Counters kept on a solution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionCounter {
    Comments,
}

impl SolutionCounter {
    pub const fn column(self) -> &'static str {
        match self {
            SolutionCounter::Comments => "comment_count",
        }
    }
}

/// Reputation counters kept on a member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReputationCounter {
    ProblemsSolved,
    SolutionsProvided,
}

impl ReputationCounter {
    pub const fn column(self) -> &'static str {
        match self {
            ReputationCounter::ProblemsSolved => "problems_solved",
            ReputationCounter::SolutionsProvided => "solutions_provided",
        }
    }
}

/// Something a member can upvote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpvoteTarget {
    Problem(ProblemId),
    Solution(SolutionId),
}

impl UpvoteTarget {
    pub fn label(&self) -> &'static str {
        match self {
            UpvoteTarget::Problem(_) => "Problem",
            UpvoteTarget::Solution(_) => "Solution",
        }
    }

    pub fn not_found(&self) -> ForumError {
        match self {
            UpvoteTarget::Problem(_) => ForumError::ProblemNotFound,
            UpvoteTarget::Solution(_) => ForumError::SolutionNotFound,
        }
    }
}

impl fmt::Display for UpvoteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpvoteTarget::Problem(id) => write!(f, "problem:{}", id),
            UpvoteTarget::Solution(id) => write!(f, "solution:{}", id),
        }
    }
}

/// Trimmed, non-empty text with an upper bound in characters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundedText(String);

impl BoundedText {
    pub fn new(raw: &str, field: &str, max_chars: usize) -> ForumResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ForumError::validation(format!("{} is required", field)));
        }
        let len = trimmed.chars().count();
        if len > max_chars {
            return Err(ForumError::validation(format!(
                "{} must be at most {} characters (got {})",
                field, max_chars, len
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocabulary_wire_names() {
        assert_eq!(
            "in-progress".parse::<ProblemStatus>().unwrap(),
            ProblemStatus::InProgress
        );
        assert_eq!(Category::Infrastructure.as_str(), "infrastructure");
        assert_eq!(Urgency::default(), Urgency::Medium);
        assert!(matches!(
            "urgent".parse::<Urgency>(),
            Err(ForumError::Validation(_))
        ));
        assert_eq!(
            serde_json::to_string(&ProblemStatus::InProgress).unwrap(),
            "\"in-progress\""
        );
    }

    #[test]
    fn test_manual_transitions() {
        use ProblemStatus::*;

        assert!(Open.check_manual_transition(InProgress).is_ok());
        assert!(InProgress.check_manual_transition(Closed).is_ok());
        assert!(Closed.check_manual_transition(Open).is_ok());
        assert!(Resolved.check_manual_transition(Closed).is_ok());
        assert!(Resolved.check_manual_transition(Resolved).is_ok());

        assert!(Open.check_manual_transition(Resolved).is_err());
        assert!(Resolved.check_manual_transition(Open).is_err());
        assert!(Resolved.check_manual_transition(InProgress).is_err());
    }

    #[test]
    fn test_delta_never_negative() {
        assert_eq!(Delta::Increment.apply(0).unwrap(), 1);
        assert_eq!(Delta::Decrement.apply(3).unwrap(), 2);
        assert!(matches!(
            Delta::Decrement.apply(0),
            Err(ForumError::Internal(_))
        ));
    }

    #[test]
    fn test_bounded_text() {
        assert_eq!(
            BoundedText::new("  fix the pump  ", "Title", 200)
                .unwrap()
                .as_str(),
            "fix the pump"
        );
        assert!(BoundedText::new("   ", "Title", 200).is_err());
        assert!(BoundedText::new(&"é".repeat(5), "Text", 5).is_ok());
        assert!(BoundedText::new(&"é".repeat(6), "Text", 5).is_err());
    }
}
