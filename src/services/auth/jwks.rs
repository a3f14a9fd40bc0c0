/*
 * Responsibility
 * - IdP が公開する JWKS の取得とキャッシュ (TTL + kid ミス時の再取得)
 * - kid → DecodingKey の解決
 * - HTTP まわりはここに閉じ込める (verifier は鍵の出どころを知らない)
 */
use std::time::{Duration, Instant};

use jsonwebtoken::DecodingKey;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use thiserror::Error;
use tokio::sync::RwLock;
use url::Url;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum JwksError {
    #[error("failed to fetch jwks: {0}")]
    Fetch(String),
    #[error("failed to parse jwks: {0}")]
    Parse(String),
    #[error("key not found: {0}")]
    KeyNotFound(String),
    #[error("jwks contains no keys")]
    NoKeys,
    #[error("invalid jwk: {0}")]
    InvalidKey(String),
}

#[derive(Debug)]
struct CachedJwks {
    keys: JwkSet,
    fetched_at: Instant,
}

/// JWKS client with an in-memory TTL cache.
///
/// - `new`: lazily fetches from `jwks_url`; refreshes after `cache_ttl`
///   or when a `kid` is missing from the cached set (key rotation).
/// - `from_static`: fixed key set, never fetches (tests / offline).
#[derive(Debug)]
pub struct JwksClient {
    http: reqwest::Client,
    jwks_url: Option<Url>,
    cache_ttl: Duration,
    cache: RwLock<Option<CachedJwks>>,
}

impl JwksClient {
    pub fn new(jwks_url: Url, cache_ttl: Duration) -> Result<Self, JwksError> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| JwksError::Fetch(e.to_string()))?;

        Ok(Self {
            http,
            jwks_url: Some(jwks_url),
            cache_ttl,
            cache: RwLock::new(None),
        })
    }

    /// 固定キーセットで作る。HTTP には一切出ない (テスト用)。
    #[cfg(test)]
    pub fn from_static(keys: JwkSet) -> Self {
        Self {
            http: reqwest::Client::new(),
            jwks_url: None,
            cache_ttl: Duration::MAX,
            cache: RwLock::new(Some(CachedJwks {
                keys,
                fetched_at: Instant::now(),
            })),
        }
    }

    /// `kid` に対応する DecodingKey を返す。
    /// キャッシュに無ければ一度だけ再取得してから探す (鍵ローテーション対応)。
    pub async fn decoding_key(&self, kid: Option<&str>) -> Result<DecodingKey, JwksError> {
        if let Some(jwk) = self.lookup(kid).await {
            return DecodingKey::from_jwk(&jwk).map_err(|e| JwksError::InvalidKey(e.to_string()));
        }

        self.refresh().await?;

        let jwk = self.lookup(kid).await.ok_or_else(|| match kid {
            Some(kid) => JwksError::KeyNotFound(kid.to_string()),
            None => JwksError::NoKeys,
        })?;

        DecodingKey::from_jwk(&jwk).map_err(|e| JwksError::InvalidKey(e.to_string()))
    }

    // キャッシュが有効なら kid で引く (kid 無しのトークンは先頭キー)
    async fn lookup(&self, kid: Option<&str>) -> Option<Jwk> {
        let cache = self.cache.read().await;
        let cached = cache.as_ref()?;

        if self.jwks_url.is_some() && cached.fetched_at.elapsed() > self.cache_ttl {
            return None;
        }

        match kid {
            Some(kid) => cached.keys.find(kid).cloned(),
            None => cached.keys.keys.first().cloned(),
        }
    }

    async fn refresh(&self) -> Result<(), JwksError> {
        let Some(url) = &self.jwks_url else {
            // 固定キーセットは再取得しない
            return Ok(());
        };

        let resp = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| JwksError::Fetch(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(JwksError::Fetch(format!("HTTP {}: {}", resp.status(), url)));
        }

        let keys: JwkSet = resp.json().await.map_err(|e| JwksError::Parse(e.to_string()))?;

        tracing::debug!(count = keys.keys.len(), "refreshed jwks");

        let mut cache = self.cache.write().await;
        *cache = Some(CachedJwks {
            keys,
            fetched_at: Instant::now(),
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_set() -> JwkSet {
        serde_json::from_value(serde_json::json!({ "keys": [] })).unwrap()
    }

    #[tokio::test]
    async fn static_client_reports_missing_kid() {
        let client = JwksClient::from_static(empty_set());

        let err = client.decoding_key(Some("nope")).await.unwrap_err();
        assert!(matches!(err, JwksError::KeyNotFound(kid) if kid == "nope"));
    }

    #[tokio::test]
    async fn static_client_with_no_keys_reports_no_keys() {
        let client = JwksClient::from_static(empty_set());

        let err = client.decoding_key(None).await.unwrap_err();
        assert!(matches!(err, JwksError::NoKeys));
    }
}
