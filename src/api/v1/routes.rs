/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - ここに並ぶルートは全て access token 必須 (middleware は app.rs 側で適用)
 */
use axum::{Router, routing::get};

use crate::state::AppState;

use crate::api::v1::handlers::notes::{create_note, list_notes};

pub fn routes() -> Router<AppState> {
    Router::new().route("/notes", get(list_notes).post(create_note))
}
