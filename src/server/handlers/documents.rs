use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::core::errors::{ApiError, RagError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    /// Name of the uploaded file, kept as chunk metadata.
    pub filename: Option<String>,
}

/// Index the request body (plain UTF-8 text) as the session's document.
pub async fn upload_document(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Query(params): Query<UploadParams>,
    body: String,
) -> Result<impl IntoResponse, ApiError> {
    let source = params
        .filename
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| "document.txt".to_string());

    let summary = state
        .pipeline
        .index_document(&session_id, &source, &body)
        .await?;
    Ok(Json(summary))
}

pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let removed = state
        .pipeline
        .remove_document(&session_id)
        .await
        .map_err(|e| match e {
            RagError::NoIndex(_) => ApiError::NotFound(e.to_string()),
            other => other.into(),
        })?;

    Ok(Json(json!({ "status": "deleted", "removed_chunks": removed })))
}
