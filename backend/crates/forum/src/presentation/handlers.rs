//! HTTP Handlers
//!
//! Mutating handlers take a [`Principal`]; the extractor rejects with 401
//! before any workflow runs.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use kernel::id::{ProblemId, SolutionId, UserId};
use kernel::principal::Principal;
use uuid::Uuid;

use crate::application::accept_solution::AcceptSolutionUseCase;
use crate::application::add_comment::AddCommentUseCase;
use crate::application::config::ForumConfig;
use crate::application::create_problem::{CreateProblemInput, CreateProblemUseCase};
use crate::application::members::{
    MemberDirectory, ResolveMembersUseCase, problem_authors, solution_authors,
};
use crate::application::query_problems::{ListProblemsInput, QueryProblemsUseCase};
use crate::application::submit_solution::{SubmitSolutionInput, SubmitSolutionUseCase};
use crate::application::toggle_upvote::ToggleUpvoteUseCase;
use crate::application::update_problem::{UpdateProblemInput, UpdateProblemUseCase};
use crate::domain::repository::ForumStore;
use crate::domain::value_objects::UpvoteTarget;
use crate::error::ForumResult;
use crate::presentation::dto::{
    AcceptSolutionResponse, AddCommentRequest, AddCommentResponse, CommentResponse,
    CreateProblemRequest, ListProblemsQuery, ProblemEnvelope, ProblemListResponse,
    ProblemResponse, SolutionEnvelope, SolutionResponse, SubmitSolutionRequest,
    UpdateProblemRequest, UpvoteResponse,
};

/// Shared state for forum handlers
#[derive(Clone)]
pub struct ForumAppState<R>
where
    R: ForumStore,
{
    pub repo: Arc<R>,
    pub config: Arc<ForumConfig>,
}

impl<R> ForumAppState<R>
where
    R: ForumStore,
{
    fn query_use_case(&self) -> QueryProblemsUseCase<R, R, R> {
        QueryProblemsUseCase::new(
            self.repo.clone(),
            self.repo.clone(),
            self.repo.clone(),
            self.config.clone(),
        )
    }

    fn toggle_use_case(&self) -> ToggleUpvoteUseCase<R> {
        ToggleUpvoteUseCase::new(self.repo.clone())
    }

    async fn members(&self, user_ids: Vec<UserId>) -> ForumResult<MemberDirectory> {
        ResolveMembersUseCase::new(self.repo.clone())
            .execute(user_ids)
            .await
    }
}

/// GET /api/problems
pub async fn list_problems<R>(
    State(state): State<ForumAppState<R>>,
    Query(query): Query<ListProblemsQuery>,
) -> ForumResult<Json<ProblemListResponse>>
where
    R: ForumStore,
{
    let input = ListProblemsInput {
        page: query.page,
        limit: query.limit,
        category: query.category,
        status: query.status,
        search: query.search,
    };

    let page = state.query_use_case().list(input).await?;
    let members = state.members(problem_authors(&page.items)).await?;

    Ok(Json(ProblemListResponse::new(page, &members)))
}

/// POST /api/problems
pub async fn create_problem<R>(
    State(state): State<ForumAppState<R>>,
    principal: Principal,
    Json(req): Json<CreateProblemRequest>,
) -> ForumResult<(StatusCode, Json<ProblemEnvelope>)>
where
    R: ForumStore,
{
    let use_case = CreateProblemUseCase::new(state.repo.clone(), state.config.clone());

    let input = CreateProblemInput {
        title: req.title,
        description: req.description,
        location: req.location,
        category: req.category,
        urgency: req.urgency,
        images: req.images,
    };

    let problem = use_case.execute(input, principal.user_id).await?;
    let members = state.members(vec![problem.created_by]).await?;

    Ok((
        StatusCode::CREATED,
        Json(ProblemEnvelope {
            message: "Problem created successfully",
            problem: ProblemResponse::new(problem, &members),
        }),
    ))
}

/// GET /api/problems/{id}
pub async fn get_problem<R>(
    State(state): State<ForumAppState<R>>,
    principal: Option<Principal>,
    Path(id): Path<Uuid>,
) -> ForumResult<Json<ProblemResponse>>
where
    R: ForumStore,
{
    let view = state
        .query_use_case()
        .get(ProblemId::from_uuid(id), principal.map(|p| p.user_id))
        .await?;

    let members = state.members(vec![view.problem.created_by]).await?;
    let mut response = ProblemResponse::new(view.problem, &members);
    response.has_upvoted = view.has_upvoted;

    Ok(Json(response))
}

/// PUT /api/problems/{id}
pub async fn update_problem<R>(
    State(state): State<ForumAppState<R>>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProblemRequest>,
) -> ForumResult<Json<ProblemEnvelope>>
where
    R: ForumStore,
{
    let use_case = UpdateProblemUseCase::new(state.repo.clone(), state.config.clone());

    let input = UpdateProblemInput {
        title: req.title,
        description: req.description,
        location: req.location,
        category: req.category,
        urgency: req.urgency,
        status: req.status,
        images: req.images,
    };

    let problem = use_case
        .execute(ProblemId::from_uuid(id), input, principal.user_id)
        .await?;
    let members = state.members(vec![problem.created_by]).await?;

    Ok(Json(ProblemEnvelope {
        message: "Problem updated successfully",
        problem: ProblemResponse::new(problem, &members),
    }))
}

/// POST /api/problems/{id}/upvote
pub async fn upvote_problem<R>(
    State(state): State<ForumAppState<R>>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> ForumResult<Json<UpvoteResponse>>
where
    R: ForumStore,
{
    let output = state
        .toggle_use_case()
        .execute(
            UpvoteTarget::Problem(ProblemId::from_uuid(id)),
            principal.user_id,
        )
        .await?;

    Ok(Json(UpvoteResponse {
        message: if output.has_upvoted {
            "Problem upvoted"
        } else {
            "Upvote removed"
        },
        upvote_count: output.upvote_count,
        has_upvoted: output.has_upvoted,
    }))
}

/// GET /api/problems/{id}/solutions
pub async fn list_solutions<R>(
    State(state): State<ForumAppState<R>>,
    Path(id): Path<Uuid>,
) -> ForumResult<Json<Vec<SolutionResponse>>>
where
    R: ForumStore,
{
    let solutions = state
        .query_use_case()
        .solutions(ProblemId::from_uuid(id))
        .await?;
    let members = state.members(solution_authors(&solutions)).await?;

    Ok(Json(
        solutions
            .into_iter()
            .map(|s| SolutionResponse::new(s, &members))
            .collect(),
    ))
}

/// POST /api/solutions
pub async fn submit_solution<R>(
    State(state): State<ForumAppState<R>>,
    principal: Principal,
    Json(req): Json<SubmitSolutionRequest>,
) -> ForumResult<(StatusCode, Json<SolutionEnvelope>)>
where
    R: ForumStore,
{
    let use_case = SubmitSolutionUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.config.clone(),
    );

    let input = SubmitSolutionInput {
        problem_id: ProblemId::from_uuid(req.problem_id),
        description: req.description,
    };

    let solution = use_case.execute(input, principal.user_id).await?;
    let members = state.members(solution_authors([&solution])).await?;

    Ok((
        StatusCode::CREATED,
        Json(SolutionEnvelope {
            message: "Solution added successfully",
            solution: SolutionResponse::new(solution, &members),
        }),
    ))
}

/// POST /api/solutions/{id}/upvote
pub async fn upvote_solution<R>(
    State(state): State<ForumAppState<R>>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> ForumResult<Json<UpvoteResponse>>
where
    R: ForumStore,
{
    let output = state
        .toggle_use_case()
        .execute(
            UpvoteTarget::Solution(SolutionId::from_uuid(id)),
            principal.user_id,
        )
        .await?;

    Ok(Json(UpvoteResponse {
        message: if output.has_upvoted {
            "Solution upvoted"
        } else {
            "Upvote removed"
        },
        upvote_count: output.upvote_count,
        has_upvoted: output.has_upvoted,
    }))
}

/// POST /api/solutions/{id}/comments
pub async fn add_comment<R>(
    State(state): State<ForumAppState<R>>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Json(req): Json<AddCommentRequest>,
) -> ForumResult<(StatusCode, Json<AddCommentResponse>)>
where
    R: ForumStore,
{
    let use_case = AddCommentUseCase::new(state.repo.clone(), state.config.clone());

    let output = use_case
        .execute(SolutionId::from_uuid(id), principal.user_id, &req.text)
        .await?;
    let members = state.members(vec![output.comment.user_id]).await?;

    Ok((
        StatusCode::CREATED,
        Json(AddCommentResponse {
            message: "Comment added successfully",
            comment: CommentResponse::new(output.comment, &members),
            comment_count: output.comment_count,
        }),
    ))
}

/// PATCH /api/solutions/{id}/accept
pub async fn accept_solution<R>(
    State(state): State<ForumAppState<R>>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> ForumResult<Json<AcceptSolutionResponse>>
where
    R: ForumStore,
{
    let use_case =
        AcceptSolutionUseCase::new(state.repo.clone(), state.repo.clone(), state.repo.clone());

    let output = use_case
        .execute(SolutionId::from_uuid(id), principal.user_id)
        .await?;
    let members = state.members(solution_authors([&output.solution])).await?;

    Ok(Json(AcceptSolutionResponse {
        message: "Solution accepted successfully",
        solution: SolutionResponse::new(output.solution, &members),
        problem_status: output.problem_status,
    }))
}
