use super::ApiError;
use crate::state::SharedState;
use axum::{
    extract::{Path as UrlPath, State},
    http::header,
    response::{IntoResponse, Response},
};

/// GET /api/download/{filename}
///
/// Serves a processed file as an attachment. The filename must be a
/// plain name, path traversal is rejected.
pub async fn download_file(
    State(state): State<SharedState>,
    UrlPath(filename): UrlPath<String>,
) -> Result<Response, ApiError> {
    if filename.contains('/') || filename.contains('\\') || filename.contains("..") {
        return Err(ApiError::bad_request("invalid filename"));
    }

    let path = state.storage.processed_dir.join(&filename);
    if !path.is_file() {
        return Err(ApiError::not_found("File not found"));
    }

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| ApiError::internal("failed to read file"))?;

    let headers = [
        (header::CONTENT_TYPE, "application/octet-stream".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"colorized_{}\"", filename),
        ),
    ];

    Ok((headers, bytes).into_response())
}
