//! HTTP routes of the inference service.

mod colorize;
mod files;
mod health;

pub use colorize::*;
pub use files::*;
pub use health::*;

use crate::{common::*, state::SharedState};
use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

/// Maximum accepted upload size.
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Build the service router.
///
/// The request body cap sits slightly above the upload limit so the
/// multipart framing overhead does not mask the explicit size check.
pub fn build_router(state: SharedState) -> Router {
    let processed_dir = state.storage.processed_dir.clone();

    Router::new()
        .route("/", get(root))
        .route("/api/health", get(health_check))
        .route("/api/colorize", post(colorize_image))
        .route("/api/download/:filename", get(download_file))
        .nest_service("/processed", ServeDir::new(processed_dir))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 1024 * 1024))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// An error response with a status code and a message body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "status": "error",
            "message": self.message,
        }));
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        colorizer::{Colorizer, ColorizerOptions},
        state::{AppState, Storage},
    };
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request},
    };
    use serde_json::Value;
    use tower::ServiceExt as _;

    struct TestApp {
        _dir: tempfile::TempDir,
        storage: Storage,
        router: Router,
    }

    fn mock_app() -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path());
        storage.ensure_dirs().unwrap();

        let colorizer = Colorizer::new(
            ColorizerOptions {
                model_file: dir.path().join("absent_model.pt"),
                device: Device::Cpu,
                render_factor: 35,
            },
            &storage,
        );
        let state = Arc::new(AppState {
            colorizer,
            storage: storage.clone(),
        });

        TestApp {
            _dir: dir,
            storage,
            router: build_router(state),
        }
    }

    fn multipart_request(content_type: &str, data: &[u8]) -> Request<Body> {
        let boundary = "test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; \
                 filename=\"photo.png\"\r\nContent-Type: {}\r\n\r\n",
                boundary, content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/colorize")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn response_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_mock_mode() {
        let app = mock_app();
        let response = app
            .router
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["model_loaded"], false);
    }

    #[tokio::test]
    async fn non_image_upload_is_rejected() {
        let app = mock_app();
        let response = app
            .router
            .oneshot(multipart_request("text/plain", b"hello"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = response_json(response).await;
        assert_eq!(body["message"], "File must be an image");
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected_and_nothing_persists() {
        let app = mock_app();
        let payload = vec![0u8; MAX_UPLOAD_BYTES + 1];
        let response = app
            .router
            .clone()
            .oneshot(multipart_request("image/png", &payload))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(fs::read_dir(&app.storage.processed_dir).unwrap().count(), 0);
        assert_eq!(fs::read_dir(&app.storage.uploads_dir).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn mock_upload_roundtrips_through_download() {
        let app = mock_app();
        let payload = b"pretend png bytes".to_vec();
        let response = app
            .router
            .clone()
            .oneshot(multipart_request("image/png", &payload))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        assert_eq!(body["status"], "success");
        let filename = body["filename"].as_str().unwrap().to_string();
        assert!(filename.starts_with("mock_"));
        assert_eq!(
            body["download_url"],
            format!("/api/download/{}", filename)
        );

        let response = app
            .router
            .oneshot(
                Request::builder()
                    .uri(format!("/api/download/{}", filename))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(bytes.as_ref(), payload.as_slice());
    }

    #[tokio::test]
    async fn download_rejects_path_traversal() {
        let app = mock_app();
        let response = app
            .router
            .oneshot(
                Request::builder()
                    .uri("/api/download/..%2Fsecret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn download_missing_file_is_not_found() {
        let app = mock_app();
        let response = app
            .router
            .oneshot(
                Request::builder()
                    .uri("/api/download/absent.png")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
