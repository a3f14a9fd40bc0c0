/// Factory: build `AuthService` from application `Config`.
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::AppError;
use crate::services::auth::AuthService;
use crate::services::auth::jwks::JwksClient;

pub fn build_auth_service(config: &Config) -> Result<Arc<AuthService>, AppError> {
    let jwks = JwksClient::new(
        config.jwks_url.clone(),
        Duration::from_secs(config.jwks_cache_ttl_seconds),
    )
    .map_err(|e| {
        tracing::error!(error = %e, "failed to build jwks client");
        AppError::Internal
    })?;

    let auth = AuthService::new(jwks, &config.auth_issuer, config.access_token_leeway_seconds);

    Ok(Arc::new(auth))
}
