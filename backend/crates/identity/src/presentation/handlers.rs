//! HTTP Handlers

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use kernel::principal::Principal;

use crate::application::config::IdentityConfig;
use crate::application::{LoginInput, LoginUseCase, MeUseCase, RegisterInput, RegisterUseCase};
use crate::domain::repository::UserRepository;
use crate::error::IdentityResult;
use crate::presentation::dto::{AuthResponse, LoginRequest, MeResponse, RegisterRequest};

/// Shared state for identity handlers
#[derive(Clone)]
pub struct IdentityAppState<R>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub config: Arc<IdentityConfig>,
}

/// POST /api/auth/register
pub async fn register<R>(
    State(state): State<IdentityAppState<R>>,
    Json(req): Json<RegisterRequest>,
) -> IdentityResult<impl IntoResponse>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let use_case = RegisterUseCase::new(state.repo.clone(), state.config.clone());

    let input = RegisterInput {
        user_name: req.username,
        email: req.email,
        password: req.password,
    };

    let output = use_case.execute(input).await?;
    let cookie = state.config.cookie().build_set_cookie(&output.token.token);

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            message: "User registered successfully",
            token: output.token.token,
            expires_at_ms: output.token.expires_at_ms,
            user: output.user.into(),
        }),
    ))
}

/// POST /api/auth/login
pub async fn login<R>(
    State(state): State<IdentityAppState<R>>,
    Json(req): Json<LoginRequest>,
) -> IdentityResult<impl IntoResponse>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let use_case = LoginUseCase::new(state.repo.clone(), state.config.clone());

    let input = LoginInput {
        email: req.email,
        password: req.password,
    };

    let output = use_case.execute(input).await?;
    let cookie = state.config.cookie().build_set_cookie(&output.token.token);

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            message: "Login successful",
            token: output.token.token,
            expires_at_ms: output.token.expires_at_ms,
            user: output.user.into(),
        }),
    ))
}

/// POST /api/auth/logout
///
/// Tokens are stateless; logging out only expires the cookie.
pub async fn logout<R>(State(state): State<IdentityAppState<R>>) -> impl IntoResponse
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let cookie = state.config.cookie().build_delete_cookie();
    (StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)])
}

/// GET /api/auth/me
pub async fn me<R>(
    State(state): State<IdentityAppState<R>>,
    principal: Principal,
) -> IdentityResult<Json<MeResponse>>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let user = MeUseCase::new(state.repo.clone())
        .execute(principal.user_id)
        .await?;

    Ok(Json(MeResponse { user: user.into() }))
}
