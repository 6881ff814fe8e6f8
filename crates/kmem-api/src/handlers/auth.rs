//! Signup, login, logout and current-user handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use kmem_core::error::AppError;

use crate::cookies::{cleared_cookies, token_cookies};
use crate::dto::request::{Credentials, validated};
use crate::dto::response::{ApiResponse, MessageResponse, UserResponse};
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /auth/signup
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<Credentials>,
) -> ApiResult<impl IntoResponse> {
    let req = validated(req)?;
    state.credentials.check(&req.username, &req.password)?;

    let hasher = state.password_hasher.clone();
    let password = req.password;
    let hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| AppError::internal(format!("Hashing task failed: {e}")))??;

    let user = state.users.create_user(&req.username, &hash).await?;
    tracing::info!(username = %user.username, "User signed up");

    let pair = state.jwt_encoder.issue_pair(&user.username)?;
    Ok((
        StatusCode::CREATED,
        token_cookies(&state, &pair)?,
        Json(ApiResponse::ok(UserResponse {
            username: user.username,
        })),
    ))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<Credentials>,
) -> ApiResult<impl IntoResponse> {
    let req = validated(req)?;
    let invalid = || AppError::authentication("Invalid username or password");

    let user = state
        .users
        .find_by_username(&req.username)
        .await?
        .ok_or_else(invalid)?;

    let hasher = state.password_hasher.clone();
    let (password, hash) = (req.password, user.password_hash.clone());
    let matches = tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
        .await
        .map_err(|e| AppError::internal(format!("Verification task failed: {e}")))??;

    if !matches {
        tracing::debug!(username = %user.username, "Rejected login");
        return Err(invalid().into());
    }

    let pair = state.jwt_encoder.issue_pair(&user.username)?;
    Ok((
        token_cookies(&state, &pair)?,
        Json(ApiResponse::ok(UserResponse {
            username: user.username,
        })),
    ))
}

/// POST /auth/logout
pub async fn logout(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok((
        cleared_cookies(&state)?,
        Json(ApiResponse::ok(MessageResponse::new("Logged out"))),
    ))
}

/// GET /auth/me
pub async fn me(auth: AuthUser) -> Json<ApiResponse<UserResponse>> {
    Json(ApiResponse::ok(UserResponse {
        username: auth.username,
    }))
}
