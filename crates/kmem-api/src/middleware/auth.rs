//! Cookie authentication middleware.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;

use kmem_core::error::AppError;

use crate::cookies::{ACCESS_COOKIE, REFRESH_COOKIE, token_cookies};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// Resolves the caller from the `accessToken` cookie.
///
/// When the access token is missing or invalid but the `refreshToken`
/// cookie is valid, a new pair is issued and set on the response.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let access = jar
        .get(ACCESS_COOKIE)
        .ok_or_else(|| AppError::authentication("Missing access token"))
        .and_then(|c| state.jwt_decoder.decode_access(c.value()));

    let access_err = match access {
        Ok(claims) => {
            request.extensions_mut().insert(AuthUser {
                username: claims.sub,
            });
            return next.run(request).await;
        }
        Err(e) => e,
    };

    tracing::debug!("Access token rejected ({}), trying refresh token", access_err.message);

    let refreshed = jar
        .get(REFRESH_COOKIE)
        .ok_or_else(|| AppError::authentication("Authentication required"))
        .and_then(|c| state.jwt_decoder.decode_refresh(c.value()));

    let claims = match refreshed {
        Ok(claims) => claims,
        Err(e) => return ApiError(e).into_response(),
    };

    let cookies = match state
        .jwt_encoder
        .issue_pair(&claims.sub)
        .and_then(|pair| token_cookies(&state, &pair))
    {
        Ok(cookies) => cookies,
        Err(e) => return ApiError(e).into_response(),
    };

    tracing::debug!(username = %claims.sub, "Renewed tokens from refresh token");
    request.extensions_mut().insert(AuthUser {
        username: claims.sub,
    });

    (cookies, next.run(request).await).into_response()
}
