/*
 * Responsibility
 * - /notes 系 handler (list / create)
 * - 認証済みの subject (AuthCtx) で必ず絞り込む。全件取得の口は作らない
 * - 初回アクセス時のウェルカムノート作成もここ (JIT sync)
 */
use axum::{Json, extract::State, http::StatusCode};

use crate::{
    api::v1::{
        dto::notes::{CreateNoteRequest, NoteResponse},
        extractors::AuthCtxExtractor,
    },
    error::AppError,
    repos::note_repo,
    state::AppState,
};

// 新規ユーザーが最初に見るノート
const WELCOME_NOTE: &str = "歡迎來到 TrustCase！您的第一個私密筆記已在此啟動。🚀";

fn row_to_response(state: &AppState, row: note_repo::NoteRow) -> Result<NoteResponse, AppError> {
    let public_id = state.id_codec.encode(row.note_id)?;

    Ok(NoteResponse {
        id: public_id,
        content: row.content,
        created_at: row.created_at,
    })
}

pub async fn list_notes(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
) -> Result<Json<Vec<NoteResponse>>, AppError> {
    let mut rows = note_repo::list_for_owner(&state.db, &ctx.user_id).await?;

    // 初回アクセスならウェルカムノートを作ってから読み直す
    if rows.is_empty() {
        tracing::info!(session_id = ?ctx.session_id, "first visit, seeding welcome note");
        note_repo::create(&state.db, &ctx.user_id, WELCOME_NOTE).await?;
        rows = note_repo::list_for_owner(&state.db, &ctx.user_id).await?;
    }

    let mut res = Vec::with_capacity(rows.len());
    for row in rows {
        res.push(row_to_response(&state, row)?);
    }

    Ok(Json(res))
}

pub async fn create_note(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    Json(req): Json<CreateNoteRequest>,
) -> Result<(StatusCode, Json<NoteResponse>), AppError> {
    req.validate()
        .map_err(|msg| AppError::bad_request("INVALID_NOTE", msg))?;

    let row = note_repo::create(&state.db, &ctx.user_id, &req.content).await?;

    let res = row_to_response(&state, row)?;
    Ok((StatusCode::CREATED, Json(res)))
}
