/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - middleware が検証して request extensions に格納し、handler はこの型だけを受け取る
 *
 * Notes
 * - JWT の検証ロジックは middleware/services 側の責務
 * - ここは「型（契約）」として固定化する
 */

/// 認証済みのリクエストに付与されるコンテキスト
///
/// - `user_id` は IdP の subject (不透明な文字列)。ノートの owner とそのまま突き合わせる
/// - `session_id` は IdP のセッション ID (ログ相関用。必須ではない)
#[derive(Debug, Clone)]
pub struct AuthCtx {
    pub user_id: String,
    pub session_id: Option<String>,
}

impl AuthCtx {
    pub fn new(user_id: String, session_id: Option<String>) -> Self {
        Self {
            user_id,
            session_id,
        }
    }
}
