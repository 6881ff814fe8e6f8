//! Route definitions for the kmem HTTP API.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post, put},
};
use tower_http::services::ServeDir;

use crate::handlers;
use crate::middleware::auth::require_auth;
use crate::state::AppState;

/// Build the router. Routes in [`protected_routes`] sit behind the cookie
/// auth middleware; uploaded media is served under `/static`.
pub fn build_router(state: AppState) -> Router {
    let uploads = ServeDir::new(state.uploads.root());

    Router::new()
        .merge(public_routes())
        .merge(protected_routes(state.clone()))
        .nest_service("/static", uploads)
        .with_state(state)
}

/// Probe and session endpoints
fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/ping", get(handlers::health::ping))
        .route("/auth/signup", post(handlers::auth::signup))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(handlers::auth::me))
        .route("/files", get(handlers::files::list_files))
        .route("/files/upload", post(handlers::files::upload))
        .route(
            "/files/{id}",
            put(handlers::files::rename_file).delete(handlers::files::delete_file),
        )
        .route("/stats/usage", get(handlers::stats::usage))
        .route_layer(axum_middleware::from_fn_with_state(state, require_auth))
}
