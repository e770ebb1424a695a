//! Forum Router
//!
//! Routes are relative to `/api`; the caller is expected to layer the
//! principal middleware on top.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::application::config::ForumConfig;
use crate::domain::repository::ForumStore;
use crate::infra::postgres::PgForumStore;
use crate::presentation::handlers::{self, ForumAppState};

/// Create the forum router with the PostgreSQL store
pub fn forum_router(store: PgForumStore, config: ForumConfig) -> Router {
    forum_router_generic(store, config)
}

/// Create a forum router for any store implementation
pub fn forum_router_generic<R>(store: R, config: ForumConfig) -> Router
where
    R: ForumStore,
{
    let state = ForumAppState {
        repo: Arc::new(store),
        config: Arc::new(config),
    };

    Router::new()
        .route(
            "/problems",
            get(handlers::list_problems::<R>).post(handlers::create_problem::<R>),
        )
        .route(
            "/problems/{id}",
            get(handlers::get_problem::<R>).put(handlers::update_problem::<R>),
        )
        .route("/problems/{id}/upvote", post(handlers::upvote_problem::<R>))
        .route(
            "/problems/{id}/solutions",
            get(handlers::list_solutions::<R>),
        )
        .route("/solutions", post(handlers::submit_solution::<R>))
        .route(
            "/solutions/{id}/upvote",
            post(handlers::upvote_solution::<R>),
        )
        .route(
            "/solutions/{id}/comments",
            post(handlers::add_comment::<R>),
        )
        .route(
            "/solutions/{id}/accept",
            patch(handlers::accept_solution::<R>),
        )
        .with_state(state)
}
