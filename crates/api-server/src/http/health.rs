use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

pub(super) async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

pub(super) async fn readyz() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ready" })))
}
