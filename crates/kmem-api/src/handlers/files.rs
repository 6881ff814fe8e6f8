//! Gallery listing, upload, delete and rename.

use axum::Json;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use futures::TryStreamExt;

use kmem_cache::keys;
use kmem_core::error::AppError;
use kmem_entity::{File, InsertOutcome, NewFile};
use kmem_storage::ByteStream;
use kmem_storage::naming::{process_filename, validate_filename};
use kmem_worker::ThumbnailJob;

use crate::dto::request::{GalleryParams, RenameRequest, UploadParams, validated};
use crate::dto::response::{ApiResponse, GalleryPage, MessageResponse};
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /files
pub async fn list_files(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<GalleryParams>,
) -> ApiResult<Json<ApiResponse<GalleryPage>>> {
    let query = params.into_query()?;
    let key = keys::gallery_page(&auth.username, &query);

    if let Some(page) = state.cache.get_json::<GalleryPage>(&key) {
        return Ok(Json(ApiResponse::ok(page)));
    }

    let (files, total) = tokio::try_join!(
        state.files.list_gallery(&auth.username, &query),
        state.files.count_gallery(&auth.username, &query),
    )?;

    let page = GalleryPage::new(files, &query, total);
    if let Err(e) = state.cache.set_json(&key, &page) {
        tracing::warn!(%key, "Failed to cache gallery page: {}", e);
    }

    Ok(Json(ApiResponse::ok(page)))
}

/// POST /files/upload?filename=<base64>
///
/// The request body is the raw file content.
pub async fn upload(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<UploadParams>,
    body: Body,
) -> ApiResult<impl IntoResponse> {
    if params.filename.is_empty() {
        return Err(AppError::validation("filename required").into());
    }
    let name = process_filename(&params.filename)?;

    let stream: ByteStream = Box::pin(body.into_data_stream().map_err(std::io::Error::other));
    let stored = state
        .uploads
        .write_stream(&auth.username, &name.stored_name, stream)
        .await?;

    let new_file = NewFile {
        owner: auth.username.clone(),
        hash: stored.hash.clone(),
        original_name: name.original_name,
        stored_name: name.stored_name,
        file_path: stored.path.to_string_lossy().into_owned(),
        relative_path: stored.relative_path.clone(),
        file_size: stored.size as i64,
        mime_type: name.mime_type.to_string(),
    };

    let outcome = match state.files.insert_file(new_file).await {
        Ok(outcome) => outcome,
        Err(e) => {
            state.uploads.remove(&stored.path).await;
            return Err(e.into());
        }
    };

    state.cache.invalidate_owner(&auth.username);

    let file = match outcome {
        InsertOutcome::Created(file) => {
            tracing::info!(owner = %file.owner, file_id = file.id, size = file.file_size, "Uploaded file");
            queue_thumbnails(&state, file.clone());
            file
        }
        InsertOutcome::Restored(file) => {
            // The restored record still points at its original bytes.
            state.uploads.remove(&stored.path).await;
            tracing::info!(owner = %file.owner, file_id = file.id, "Restored soft-deleted file");
            file
        }
    };

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(file))))
}

/// Hand a thumbnail job to the pool without holding up the response.
fn queue_thumbnails(state: &AppState, file: File) {
    let pool = state.pool.clone();
    let file_id = file.id;
    let job = ThumbnailJob::new(state.jobs.clone(), file);

    tokio::spawn(async move {
        if let Err(e) = pool.submit(Box::new(job)).await {
            tracing::warn!(file_id, "Thumbnail job not queued: {}", e);
        }
    });
}

/// DELETE /files/{id}
pub async fn delete_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<ApiResponse<MessageResponse>>> {
    if !state.files.soft_delete(&auth.username, id).await? {
        return Err(AppError::not_found(format!("File {id} not found")).into());
    }

    state.cache.invalidate_owner(&auth.username);
    tracing::info!(owner = %auth.username, file_id = id, "Soft-deleted file");

    Ok(Json(ApiResponse::ok(MessageResponse::new("File deleted"))))
}

/// PUT /files/{id}
pub async fn rename_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<RenameRequest>,
) -> ApiResult<Json<ApiResponse<MessageResponse>>> {
    let req = validated(req)?;
    validate_filename(&req.new_name)?;

    if !state.files.rename(&auth.username, id, &req.new_name).await? {
        return Err(AppError::not_found(format!("File {id} not found")).into());
    }

    state.cache.invalidate_owner(&auth.username);
    tracing::info!(owner = %auth.username, file_id = id, "Renamed file");

    Ok(Json(ApiResponse::ok(MessageResponse::new("File renamed"))))
}
