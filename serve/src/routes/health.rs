use crate::state::SharedState;
use axum::{extract::State, response::Json};
use serde_json::{json, Value};

/// GET /api/health
pub async fn health_check(State(state): State<SharedState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "serve",
        "model_loaded": state.colorizer.is_model_loaded(),
    }))
}

/// GET /
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "coloraize API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/api/health",
            "colorize": "POST /api/colorize",
            "download": "GET /api/download/{filename}",
            "preview": "GET /processed/{filename}",
        },
    }))
}
