//! Identity Router
//!
//! Routes are relative to `/api`.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::application::config::IdentityConfig;
use crate::domain::repository::UserRepository;
use crate::infra::postgres::PgUserStore;
use crate::presentation::handlers::{self, IdentityAppState};

/// Create the identity router with the PostgreSQL store
pub fn identity_router(store: PgUserStore, config: Arc<IdentityConfig>) -> Router {
    identity_router_generic(store, config)
}

/// Create an identity router for any store implementation
///
/// The config is shared with the principal middleware so both sides agree
/// on the signing secret.
pub fn identity_router_generic<R>(store: R, config: Arc<IdentityConfig>) -> Router
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let state = IdentityAppState {
        repo: Arc::new(store),
        config,
    };

    Router::new()
        .route("/auth/register", post(handlers::register::<R>))
        .route("/auth/login", post(handlers::login::<R>))
        .route("/auth/logout", post(handlers::logout::<R>))
        .route("/auth/me", get(handlers::me::<R>))
        .with_state(state)
}
