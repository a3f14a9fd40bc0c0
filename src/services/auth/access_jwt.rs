use jsonwebtoken::{Algorithm, Validation};
use serde::Deserialize;
use std::{error::Error as StdError, fmt};

use crate::services::auth::jwks::{JwksClient, JwksError};

// Errors returned by access-token verification + strict claim validation.
#[derive(Debug)]
pub enum AccessJwtError {
    Jwt(jsonwebtoken::errors::Error),
    Jwks(JwksError),
    UnsupportedAlgorithm(Algorithm),
    EmptyClaim(&'static str),
}

impl fmt::Display for AccessJwtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jwt(e) => write!(f, "jwt verification failed: {}", e),
            Self::Jwks(e) => write!(f, "jwks lookup failed: {}", e),
            Self::UnsupportedAlgorithm(alg) => write!(f, "unsupported token alg: {:?}", alg),
            Self::EmptyClaim(name) => write!(f, "empty '{}' claim", name),
        }
    }
}

impl StdError for AccessJwtError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Jwt(e) => Some(e),
            Self::Jwks(e) => Some(e),
            _ => None,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AccessJwtError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        Self::Jwt(e)
    }
}

impl From<JwksError> for AccessJwtError {
    fn from(e: JwksError) -> Self {
        Self::Jwks(e)
    }
}

/// Access token (JWT) claims.
///
/// NOTE:
/// - `aud` は検証しない。IdP のセッショントークンはフロント側 client id を
///   載せてくる（あるいは持たない）ため、バックエンドでは意味を持たない。
/// - `sid` は IdP のセッション ID。ログ相関用に保持するだけ。
#[derive(Debug, Clone, Deserialize)]
pub struct AccessTokenClaims {
    pub iss: String,
    pub sub: String,
    pub exp: u64,

    #[serde(default)]
    pub sid: Option<String>,
}

/// AuthService が返す「検証済み・アプリ側で使う型」
///
/// - `sub` は IdP が発行する不透明な文字列 (UUID とは限らない) のでそのまま持つ
#[derive(Debug, Clone)]
pub struct VerifiedAccessToken {
    pub user_id: String,
    pub session_id: Option<String>,
}

/// RS256 access-token verifier backed by the issuer's JWKS.
pub struct AuthService {
    jwks: JwksClient,
    validation: Validation,
}

impl fmt::Debug for AuthService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthService")
            .field("validation", &self.validation)
            .finish()
    }
}

impl AuthService {
    pub fn new(jwks: JwksClient, issuer: &str, leeway_seconds: u64) -> Self {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[issuer]);
        validation.leeway = leeway_seconds;
        // aud はフロント向けの値なので検証対象にしない
        validation.validate_aud = false;

        Self { jwks, validation }
    }

    // Verify and decode a JWT access token.
    pub async fn verify(&self, token: &str) -> Result<AccessTokenClaims, AccessJwtError> {
        let header = jsonwebtoken::decode_header(token)?;

        if header.alg != Algorithm::RS256 {
            return Err(AccessJwtError::UnsupportedAlgorithm(header.alg));
        }

        let key = self.jwks.decoding_key(header.kid.as_deref()).await?;

        let data = jsonwebtoken::decode::<AccessTokenClaims>(token, &key, &self.validation)?;

        Ok(data.claims)
    }

    /// Verify + strict claim validation.
    ///
    /// `jsonwebtoken::Validation` already checks:
    /// - signature (RS256, via the issuer's JWKS)
    /// - `exp` (with leeway)
    /// - `iss` (because we set it)
    ///
    /// This method additionally checks:
    /// - required claims are present *and not empty* (`iss`, `sub`, `exp`)
    pub async fn verify_strict(&self, token: &str) -> Result<AccessTokenClaims, AccessJwtError> {
        let claims = self.verify(token).await?;

        // Required (non-empty) checks. `exp` is `u64` so serde guarantees presence,
        // but we still defend against a meaningless value.
        if claims.iss.trim().is_empty() {
            return Err(AccessJwtError::EmptyClaim("iss"));
        }
        if claims.sub.trim().is_empty() {
            return Err(AccessJwtError::EmptyClaim("sub"));
        }
        if claims.exp == 0 {
            return Err(AccessJwtError::EmptyClaim("exp"));
        }

        Ok(claims)
    }

    /// Verify + strict claim validation, then convert claims into an application-friendly type.
    ///
    /// This is the recommended entry-point for middleware/handlers.
    pub async fn verify_verified(&self, token: &str) -> Result<VerifiedAccessToken, AccessJwtError> {
        let claims = self.verify_strict(token).await?;

        Ok(VerifiedAccessToken {
            user_id: claims.sub,
            session_id: claims.sid,
        })
    }
}
