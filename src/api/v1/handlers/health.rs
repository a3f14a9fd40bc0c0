/*
 * Responsibility
 * - GET / (疎通メッセージ) と GET /health (probe 用)
 * - 認証を通さないルートはここだけ
 */
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

pub async fn root() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({"message": "trustcase api is running"})),
    )
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}
