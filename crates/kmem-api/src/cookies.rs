//! `Set-Cookie` values for the auth token pair.

use axum::http::HeaderValue;
use axum::http::header::SET_COOKIE;
use axum::response::AppendHeaders;

use kmem_auth::TokenPair;
use kmem_core::error::AppError;

use crate::state::AppState;

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Headers setting both token cookies.
pub type CookieHeaders = AppendHeaders<[(axum::http::HeaderName, HeaderValue); 2]>;

fn cookie(name: &str, value: &str, max_age: i64, secure: bool) -> Result<HeaderValue, AppError> {
    let mut raw = format!("{name}={value}; Path=/; Max-Age={max_age}; HttpOnly; SameSite=Lax");
    if secure {
        raw.push_str("; Secure");
    }
    HeaderValue::from_str(&raw)
        .map_err(|e| AppError::internal(format!("Invalid cookie value for {name}: {e}")))
}

/// Cookies carrying a freshly issued pair.
pub fn token_cookies(state: &AppState, pair: &TokenPair) -> Result<CookieHeaders, AppError> {
    let secure = state.config.auth.secure_cookies;
    let encoder = &state.jwt_encoder;

    Ok(AppendHeaders([
        (
            SET_COOKIE,
            cookie(
                ACCESS_COOKIE,
                &pair.access_token,
                encoder.access_ttl().num_seconds(),
                secure,
            )?,
        ),
        (
            SET_COOKIE,
            cookie(
                REFRESH_COOKIE,
                &pair.refresh_token,
                encoder.refresh_ttl().num_seconds(),
                secure,
            )?,
        ),
    ]))
}

/// Cookies that make the browser drop both tokens.
pub fn cleared_cookies(state: &AppState) -> Result<CookieHeaders, AppError> {
    let secure = state.config.auth.secure_cookies;

    Ok(AppendHeaders([
        (SET_COOKIE, cookie(ACCESS_COOKIE, "", 0, secure)?),
        (SET_COOKIE, cookie(REFRESH_COOKIE, "", 0, secure)?),
    ]))
}
