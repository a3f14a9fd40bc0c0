/*
 * Responsibility
 * - user_notes テーブル向け SQLx 操作
 * - PgPool を受け取り list / create を提供 (update/delete は無い)
 * - 読み出しは必ず owner で絞る。owner 無しで全件を返す関数は作らない
 */
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::repos::error::RepoError;

// ownerId は WHERE でしか使わないので行には持たせない
#[derive(Debug, Clone, FromRow)]
pub struct NoteRow {
    #[sqlx(rename = "noteId")]
    pub note_id: i64,

    pub content: String,

    #[sqlx(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

pub async fn list_for_owner(db: &PgPool, owner_id: &str) -> Result<Vec<NoteRow>, RepoError> {
    let rows = sqlx::query_as::<_, NoteRow>(
        r#"
        SELECT "noteId", content, "createdAt"
        FROM user_notes
        WHERE "ownerId" = $1
        ORDER BY "noteId"
        "#,
    )
    .bind(owner_id)
    .fetch_all(db)
    .await?;

    Ok(rows)
}

pub async fn create(db: &PgPool, owner_id: &str, content: &str) -> Result<NoteRow, RepoError> {
    let row = sqlx::query_as::<_, NoteRow>(
        r#"
        INSERT INTO user_notes ("ownerId", content)
        VALUES ($1, $2)
        RETURNING "noteId", content, "createdAt"
        "#,
    )
    .bind(owner_id)
    .bind(content)
    .fetch_one(db)
    .await?;

    Ok(row)
}
