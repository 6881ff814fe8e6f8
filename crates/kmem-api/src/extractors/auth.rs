//! `AuthUser` extractor: the username the auth middleware resolved.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use kmem_core::error::AppError;

use crate::error::ApiError;

/// The authenticated user of a request.
///
/// Inserted into request extensions by [`crate::middleware::auth::require_auth`];
/// extracting it on a route without that middleware is a 401.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub username: String,
}

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| AppError::authentication("Authentication required").into())
    }
}
