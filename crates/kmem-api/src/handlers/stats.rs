//! Storage usage statistics.

use axum::Json;
use axum::extract::State;

use kmem_cache::keys;
use kmem_entity::UsageStats;

use crate::dto::response::ApiResponse;
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /stats/usage
pub async fn usage(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ApiResponse<UsageStats>>> {
    let key = keys::usage_stats(&auth.username);

    if let Some(stats) = state.cache.get_json::<UsageStats>(&key) {
        return Ok(Json(ApiResponse::ok(stats)));
    }

    let stats = state.files.usage(&auth.username).await?;
    if let Err(e) = state.cache.set_json(&key, &stats) {
        tracing::warn!(%key, "Failed to cache usage stats: {}", e);
    }

    Ok(Json(ApiResponse::ok(stats)))
}
