//! access token（JWT）検証 → AuthCtx を extensions に入れる
//!
//! - `Authorization: Bearer <jwt>` を受け取り、署名 / exp / iss を検証して
//!   sub を `AuthCtx.user_id` として extensions に格納する。
//! - 鍵は IdP の JWKS から解決する（services::auth 側の責務）。

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::state::AppState;

/// `/api/v1/*` に認証を掛けるための middleware を適用する。
///
/// 例：
/// ```ignore
/// let v1 = api::v1::routes();
/// let v1 = middleware::auth::access::apply(v1, state.clone());
/// app = app.nest("/api/v1", v1);
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    let token = auth.strip_prefix("Bearer ").ok_or(AppError::Unauthorized)?;

    // JWT 署名検証 + iss/exp/leeway などは AuthService 側で実施
    let verified = match state.auth.verify_verified(token).await {
        Ok(verified) => verified,
        Err(err) => {
            tracing::warn!(
                error = ?err,
                "access token verification failed"
            );
            return Err(AppError::Unauthorized);
        }
    };

    let auth_ctx = AuthCtx::new(verified.user_id, verified.session_id);

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(auth_ctx);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::time::{Duration, SystemTime};

    use axum::http::StatusCode;
    use axum::routing::get;
    use jsonwebtoken::jwk::JwkSet;
    use josekit::jwk::Jwk;
    use josekit::jws::{JwsHeader, RS256};
    use josekit::jwt::{self, JwtPayload};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use crate::api::v1::extractors::AuthCtxExtractor;
    use crate::services::auth::AuthService;
    use crate::services::auth::jwks::JwksClient;
    use crate::services::id_codec::IdCodec;

    const ISSUER: &str = "https://clerk.trustcase.example.com";
    const KID: &str = "mw-test-key";

    async fn probe(AuthCtxExtractor(ctx): AuthCtxExtractor) -> String {
        ctx.user_id
    }

    fn test_state(public_jwk: &Jwk) -> AppState {
        let n = public_jwk.parameter("n").cloned().unwrap();
        let e = public_jwk.parameter("e").cloned().unwrap();
        let set: JwkSet = serde_json::from_value(serde_json::json!({
            "keys": [{
                "kty": "RSA",
                "use": "sig",
                "alg": "RS256",
                "kid": KID,
                "n": n,
                "e": e,
            }]
        }))
        .unwrap();

        // 接続は張らない（このテストは DB に触らない）
        let db = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();

        let auth = AuthService::new(JwksClient::from_static(set), ISSUER, 0);
        let id_codec = IdCodec::new(10, "abcdefghijklmnopqrstuvwxyz").unwrap();

        AppState::new(db, id_codec, Arc::new(auth))
    }

    fn app(state: AppState) -> Router {
        let routes = Router::new().route("/probe", get(probe));
        apply(routes, state.clone()).with_state(state)
    }

    fn sign(private_jwk: &Jwk, sub: &str) -> String {
        let mut header = JwsHeader::new();
        header.set_token_type("JWT");
        header.set_key_id(KID);

        // josekit serializes sub-second SystemTime nanos as a fractional
        // NumericDate; real IdP tokens use a whole-second `exp`. Truncate so the
        // signed `exp` stays an integer (matching `exp: u64`).
        let now_secs = SystemTime::UNIX_EPOCH
            + Duration::from_secs(
                SystemTime::now()
                    .duration_since(SystemTime::UNIX_EPOCH)
                    .unwrap()
                    .as_secs(),
            );

        let mut payload = JwtPayload::new();
        payload.set_issuer(ISSUER);
        payload.set_subject(sub);
        payload.set_expires_at(&(now_secs + Duration::from_secs(600)));

        let signer = RS256.signer_from_jwk(private_jwk).unwrap();
        jwt::encode_with_signer(&payload, &header, &signer).unwrap()
    }

    #[tokio::test]
    async fn missing_authorization_header_is_401() {
        let keypair = RS256.generate_key_pair(2048).unwrap();
        let app = app(test_state(&keypair.to_jwk_public_key()));

        let res = app
            .oneshot(
                Request::builder()
                    .uri("/probe")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn non_bearer_scheme_is_401() {
        let keypair = RS256.generate_key_pair(2048).unwrap();
        let app = app(test_state(&keypair.to_jwk_public_key()));

        let res = app
            .oneshot(
                Request::builder()
                    .uri("/probe")
                    .header("authorization", "Basic dXNlcjpwYXNz")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn invalid_token_is_401() {
        let keypair = RS256.generate_key_pair(2048).unwrap();
        let app = app(test_state(&keypair.to_jwk_public_key()));

        let res = app
            .oneshot(
                Request::builder()
                    .uri("/probe")
                    .header("authorization", "Bearer not.a.jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn valid_token_reaches_handler_with_subject() {
        let keypair = RS256.generate_key_pair(2048).unwrap();
        let app = app(test_state(&keypair.to_jwk_public_key()));
        let token = sign(&keypair.to_jwk_private_key(), "user_2mw");

        let res = app
            .oneshot(
                Request::builder()
                    .uri("/probe")
                    .header("authorization", format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);

        let body = axum::body::to_bytes(res.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"user_2mw");
    }
}
