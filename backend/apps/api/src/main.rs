//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

mod config;
mod rate_limit;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{self, Method, StatusCode, header};
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router, middleware};
use forum::{ForumConfig, PgForumStore, forum_router};
use identity::{PgUserStore, attach_principal, identity_router};
use kernel::error::app_error::AppResult;
use platform::rate_limit::RateLimiter;
use serde_json::{Value, json};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{ServerConfig, identity_config_from_env};
use crate::rate_limit::{limit_by_ip, spawn_pruner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "api=info,identity=info,forum=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let server_config = ServerConfig::from_env()?;
    let identity_config = Arc::new(identity_config_from_env()?);

    // Database connection
    let pool = PgPoolOptions::new()
        .max_connections(server_config.database_max_connections)
        .connect(&server_config.database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    // CORS configuration
    let allowed_origins: Vec<http::HeaderValue> = server_config
        .frontend_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Per-IP rate limiting
    let limiter = Arc::new(RateLimiter::new(server_config.rate_limit.clone()));
    spawn_pruner(limiter.clone());
    tracing::info!(
        max_requests = server_config.rate_limit.max_requests,
        window_secs = server_config.rate_limit.window.as_secs(),
        "Rate limiting enabled"
    );

    // Build router
    let api = Router::new()
        .route("/health", get(health).with_state(pool.clone()))
        .merge(identity_router(
            PgUserStore::new(pool.clone()),
            identity_config.clone(),
        ))
        .merge(forum_router(
            PgForumStore::new(pool.clone()),
            ForumConfig::default(),
        ))
        .layer(middleware::from_fn_with_state(
            identity_config,
            attach_principal,
        ))
        .layer(middleware::from_fn_with_state(limiter, limit_by_ip));

    let app = Router::new()
        .nest("/api", api)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            server_config.request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = server_config.bind_addr;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// GET /api/health
///
/// Pool failures surface as 503 via the kernel's `sqlx::Error` conversion.
async fn health(State(pool): State<PgPool>) -> AppResult<Json<Value>> {
    sqlx::query("SELECT 1").execute(&pool).await?;
    Ok(Json(json!({ "status": "ok" })))
}
