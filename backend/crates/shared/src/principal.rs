//! Authenticated Principal
//!
//! The identity edge verifies credentials and places a [`Principal`] into
//! the request extensions. Everything downstream trusts it as-is and never
//! re-verifies.

use crate::id::UserId;

/// Verified acting user for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
}

impl Principal {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }
}

#[cfg(feature = "axum")]
mod extract {
    use std::convert::Infallible;

    use axum::extract::{FromRequestParts, OptionalFromRequestParts};
    use http::request::Parts;

    use super::Principal;
    use crate::error::app_error::AppError;

    /// Required principal: rejects with 401 before the handler body runs.
    impl<S> FromRequestParts<S> for Principal
    where
        S: Send + Sync,
    {
        type Rejection = AppError;

        async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
            parts
                .extensions
                .get::<Principal>()
                .copied()
                .ok_or_else(|| {
                    AppError::unauthorized("Authentication required")
                        .with_action("Please sign in and try again")
                })
        }
    }

    /// Optional principal for read paths that personalise their output.
    impl<S> OptionalFromRequestParts<S> for Principal
    where
        S: Send + Sync,
    {
        type Rejection = Infallible;

        async fn from_request_parts(
            parts: &mut Parts,
            _state: &S,
        ) -> Result<Option<Self>, Self::Rejection> {
            Ok(parts.extensions.get::<Principal>().copied())
        }
    }
}
