/*
 * Responsibility
 * - Notes の request/response DTO
 * - 公開 ID は encode 済みの値を返す (内部 ID を漏らさない)
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// body limit (1 MiB) とは別に、ノート単体の上限をここで張る
const MAX_CONTENT_CHARS: usize = 10_000;

#[derive(Debug, Deserialize)]
pub struct CreateNoteRequest {
    pub content: String,
}

impl CreateNoteRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.content.trim().is_empty() {
            return Err("content is required");
        }
        if self.content.chars().count() > MAX_CONTENT_CHARS {
            return Err("content is too long");
        }

        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct NoteResponse {
    pub id: String, // encoded
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_content_is_rejected() {
        let req = CreateNoteRequest {
            content: "   ".to_string(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn normal_content_passes() {
        let req = CreateNoteRequest {
            content: "買い物リスト".to_string(),
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn oversized_content_is_rejected() {
        let req = CreateNoteRequest {
            content: "a".repeat(MAX_CONTENT_CHARS + 1),
        };
        assert!(req.validate().is_err());
    }
}
