//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use kernel::id::UserId;

use crate::application::members::MemberDirectory;
use crate::domain::entities::{Comment, Problem, Solution};
use crate::domain::repository::Page;
use crate::domain::value_objects::{Category, ProblemStatus, Urgency};

/// Request for POST /api/problems
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProblemRequest {
    pub title: String,
    pub description: String,
    pub location: String,
    pub category: String,
    #[serde(default)]
    pub urgency: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Request for PUT /api/problems/{id}
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProblemRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub urgency: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
}

/// Query string for GET /api/problems
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListProblemsQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

/// Public profile of a content author
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub problems_solved: i64,
    pub solutions_provided: i64,
}

impl UserSummary {
    /// Placeholder username for accounts that no longer exist
    pub const DELETED: &'static str = "[deleted]";

    pub fn resolve(user_id: UserId, members: &MemberDirectory) -> Self {
        match members.get(&user_id) {
            Some(m) => Self {
                id: user_id.into_uuid(),
                username: m.user_name.clone(),
                avatar: m.avatar.clone(),
                bio: m.bio.clone(),
                problems_solved: m.problems_solved,
                solutions_provided: m.solutions_provided,
            },
            None => Self {
                id: user_id.into_uuid(),
                username: Self::DELETED.to_string(),
                avatar: None,
                bio: None,
                problems_solved: 0,
                solutions_provided: 0,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub images: Vec<String>,
    pub category: Category,
    pub urgency: Urgency,
    pub status: ProblemStatus,
    pub created_by: UserSummary,
    pub upvote_count: i64,
    pub solution_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Present only for authenticated viewers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_upvoted: Option<bool>,
}

impl ProblemResponse {
    pub fn new(p: Problem, members: &MemberDirectory) -> Self {
        Self {
            id: p.id.into_uuid(),
            title: p.title,
            description: p.description,
            location: p.location,
            images: p.images,
            category: p.category,
            urgency: p.urgency,
            status: p.status,
            created_by: UserSummary::resolve(p.created_by, members),
            upvote_count: p.upvote_count,
            solution_count: p.solution_count,
            created_at: p.created_at,
            updated_at: p.updated_at,
            has_upvoted: None,
        }
    }
}

/// Response for POST /api/problems and PUT /api/problems/{id}
#[derive(Debug, Clone, Serialize)]
pub struct ProblemEnvelope {
    pub message: &'static str,
    pub problem: ProblemResponse,
}

/// Response for GET /api/problems
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemListResponse {
    pub problems: Vec<ProblemResponse>,
    pub total_pages: u64,
    pub current_page: u32,
    pub total: u64,
}

impl ProblemListResponse {
    pub fn new(page: Page<Problem>, members: &MemberDirectory) -> Self {
        Self {
            total_pages: page.total_pages(),
            current_page: page.page,
            total: page.total,
            problems: page
                .items
                .into_iter()
                .map(|p| ProblemResponse::new(p, members))
                .collect(),
        }
    }
}

/// Response for the upvote toggles
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpvoteResponse {
    pub message: &'static str,
    pub upvote_count: i64,
    pub has_upvoted: bool,
}

/// Request for POST /api/solutions
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitSolutionRequest {
    pub problem_id: Uuid,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: Uuid,
    pub user: UserSummary,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl CommentResponse {
    pub fn new(c: Comment, members: &MemberDirectory) -> Self {
        Self {
            id: c.id,
            user: UserSummary::resolve(c.user_id, members),
            text: c.text,
            created_at: c.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionResponse {
    pub id: Uuid,
    pub problem_id: Uuid,
    pub proposed_by: UserSummary,
    pub description: String,
    pub upvote_count: i64,
    pub comment_count: i64,
    pub comments: Vec<CommentResponse>,
    pub is_accepted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SolutionResponse {
    pub fn new(s: Solution, members: &MemberDirectory) -> Self {
        Self {
            id: s.id.into_uuid(),
            problem_id: s.problem_id.into_uuid(),
            proposed_by: UserSummary::resolve(s.proposed_by, members),
            description: s.description,
            upvote_count: s.upvote_count,
            comment_count: s.comment_count,
            comments: s
                .comments
                .into_iter()
                .map(|c| CommentResponse::new(c, members))
                .collect(),
            is_accepted: s.is_accepted,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

/// Response for POST /api/solutions
#[derive(Debug, Clone, Serialize)]
pub struct SolutionEnvelope {
    pub message: &'static str,
    pub solution: SolutionResponse,
}

/// Response for PATCH /api/solutions/{id}/accept
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptSolutionResponse {
    pub message: &'static str,
    pub solution: SolutionResponse,
    pub problem_status: ProblemStatus,
}

/// Request for POST /api/solutions/{id}/comments
#[derive(Debug, Clone, Deserialize)]
pub struct AddCommentRequest {
    pub text: String,
}

/// Response for POST /api/solutions/{id}/comments
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCommentResponse {
    pub message: &'static str,
    pub comment: CommentResponse,
    pub comment_count: i64,
}
