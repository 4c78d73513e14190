use super::{ApiError, MAX_UPLOAD_BYTES};
use crate::{common::*, state::SharedState};
use axum::{
    extract::{Multipart, State},
    response::Json,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorizeResponse {
    pub status: String,
    pub filename: String,
    pub download_url: String,
    pub preview_url: String,
}

/// POST /api/colorize
///
/// Accepts a multipart upload under the `file` field, rejects non-image
/// content types and uploads over the size cap, and responds with the
/// download and preview locations of the colorized output.
pub async fn colorize_image(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<Json<ColorizeResponse>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::bad_request(format!("malformed multipart request: {}", err)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let is_image = field
            .content_type()
            .map(|content_type| content_type.starts_with("image/"))
            .unwrap_or(false);
        if !is_image {
            return Err(ApiError::bad_request("File must be an image"));
        }

        let filename = field
            .file_name()
            .unwrap_or("upload.jpg")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|err| ApiError::bad_request(format!("failed to read upload: {}", err)))?;

        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(ApiError::bad_request("File too large (max 20MB)"));
        }

        info!("processing image: {}", filename);

        let output_file = tokio::task::spawn_blocking({
            let state = state.clone();
            move || state.colorizer.colorize(&bytes, &filename)
        })
        .await
        .map_err(|_| ApiError::internal("colorization worker panicked"))?
        .map_err(|err| {
            error!("colorization failed: {}", err);
            ApiError::internal("colorization failed")
        })?;

        let result_filename = output_file
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| ApiError::internal("invalid output filename"))?
            .to_string();

        return Ok(Json(ColorizeResponse {
            status: "success".to_string(),
            filename: result_filename.clone(),
            download_url: format!("/api/download/{}", result_filename),
            preview_url: format!("/processed/{}", result_filename),
        }));
    }

    Err(ApiError::bad_request("missing 'file' field"))
}
