//! Per-IP request budget for everything under `/api`

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderValue, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use kernel::error::app_error::AppError;
use kernel::error::kind::ErrorKind;
use platform::rate_limit::RateLimiter;

/// Count the request against the client IP; 429 once the budget is spent
pub async fn limit_by_ip(
    State(limiter): State<Arc<RateLimiter>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let now_ms = Utc::now().timestamp_millis();
    let client_ip = addr.ip();
    let result = limiter.check_and_increment(&client_ip.to_string(), now_ms);
    let limit = HeaderValue::from(limiter.config().max_requests);

    if !result.allowed {
        tracing::warn!(client_ip = %client_ip, "Rate limit exceeded");

        let mut response = AppError::new(
            ErrorKind::TooManyRequests,
            "Too many requests from this IP, please try again later.",
        )
        .into_response();
        let headers = response.headers_mut();
        headers.insert(
            header::RETRY_AFTER,
            HeaderValue::from(result.retry_after_secs(now_ms)),
        );
        headers.insert("ratelimit-limit", limit);
        headers.insert("ratelimit-remaining", HeaderValue::from(0u32));
        return response;
    }

    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert("ratelimit-limit", limit);
    headers.insert("ratelimit-remaining", HeaderValue::from(result.remaining));
    response
}

/// Periodically forget finished windows so idle clients do not pile up
pub fn spawn_pruner(limiter: Arc<RateLimiter>) {
    let period = limiter.config().window.max(Duration::from_secs(1));

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let pruned = limiter.prune(Utc::now().timestamp_millis());
            if pruned > 0 {
                tracing::debug!(pruned, "Pruned rate limit windows");
            }
        }
    });
}
