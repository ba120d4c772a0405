// File upload to object storage
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::proxy::server::AppState;
use crate::proxy::upstream::BlobStore;

const FILE_FIELD: &str = "file";

/// Store the multipart `file` field and return its public URL
pub async fn handle_upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    match upload(&state, multipart).await {
        Ok(url) => (StatusCode::OK, Json(json!({ "url": url }))).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn upload(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<String> {
    let mut multipart = multipart.map_err(|e| {
        tracing::debug!("Upload without multipart body: {}", e);
        AppError::BadRequest("No file provided".to_string())
    })?;

    let store = BlobStore::new(&state.upstream, &state.config.storage)?;

    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Malformed upload: {}", e.body_text())))?;
        let Some(field) = field else {
            return Err(AppError::BadRequest("No file provided".to_string()));
        };
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        // A plain form value under `file` is not a blob
        let Some(filename) = field.file_name().map(str::to_string) else {
            return Err(AppError::BadRequest("Invalid file".to_string()));
        };
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Malformed upload: {}", e.body_text())))?;

        let key = BlobStore::object_key(&filename, Utc::now().timestamp_millis());
        tracing::info!("Uploading {} ({} bytes)", key, data.len());

        return store.put(&key, content_type.as_deref(), data).await;
    }
}
