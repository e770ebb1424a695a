//! Principal Middleware
//!
//! Turns a valid bearer header or token cookie into a
//! [`Principal`] request extension. Requests without one continue
//! anonymously; handlers that need a principal reject them via the
//! extractor.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use kernel::principal::Principal;
use platform::http_auth::extract_credential;

use crate::application::config::IdentityConfig;
use crate::application::principal_token;

/// Layer with `axum::middleware::from_fn_with_state(config, attach_principal)`
pub async fn attach_principal(
    State(config): State<Arc<IdentityConfig>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(token) = extract_credential(req.headers(), &config.cookie_name) {
        match principal_token::verify(&config, &token) {
            Ok(user_id) => {
                req.extensions_mut().insert(Principal::new(user_id));
            }
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring invalid principal token");
            }
        }
    }

    next.run(req).await
}
