use axum::{http::StatusCode, response::Json};
use serde_json::json;

/// Liveness only; the upstream is not contacted.
pub async fn health_check() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "service": env!("CARGO_PKG_NAME") })),
    )
}
