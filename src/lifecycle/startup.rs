//! Startup orchestration.
//!
//! # Order
//! config → logging → secret resolution → bind → serve
//!
//! Resolution finishes before the listener is bound, so no request can
//! observe a half-initialized state. A failed lookup is not a startup
//! failure; a bad config or an unbindable address is.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::AppConfig;
use crate::secrets::{DefaultCredential, Env, ResolvedSecret, ResolverConfig, SecretResolver};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Client for Key Vault and identity endpoints, with the configured per-call timeout.
pub fn vault_http_client(config: &AppConfig) -> Result<reqwest::Client, StartupError> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("keyvault-webapp/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(config.timeouts.vault_request_secs))
        .build()?;
    Ok(client)
}

/// Resolve the configured secret using credentials discovered from `env`.
pub async fn resolve_secret(config: &AppConfig, env: &Env) -> Result<ResolvedSecret, StartupError> {
    let http = vault_http_client(config)?;
    let credential = DefaultCredential::from_env(env, http.clone());
    tracing::info!(sources = ?credential.source_names(), "Credential chain ready");

    let resolver = SecretResolver::new(Arc::new(credential), http);
    let resolved = resolver
        .resolve(&ResolverConfig::from(&config.environment_config))
        .await;

    if resolved.is_fallback() {
        tracing::warn!("Key Vault secret unavailable; /keyvault will serve the fallback message");
    }
    Ok(resolved)
}

/// Bind the configured listener address.
pub async fn bind(config: &AppConfig) -> Result<TcpListener, StartupError> {
    let address = config.listener.bind_address.clone();
    TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })
}
