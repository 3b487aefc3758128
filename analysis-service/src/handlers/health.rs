use axum::{response::IntoResponse, Json};
use serde_json::json;

/// Liveness endpoint. Does not call the upstream.
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "message": "Backend server is running",
        "service": "analysis-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
