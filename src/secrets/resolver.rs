//! One-shot secret resolution with retry and fallback.

use std::fmt;
use std::sync::Arc;

use tracing::instrument;

use crate::config::schema::EnvironmentConfig;
use crate::resilience::{retry_with_backoff, RetryPolicy};
use crate::secrets::client::{KeyVaultClient, SecretStore};
use crate::secrets::credential::TokenCredential;

/// Body served on `/keyvault` when the secret could not be read.
pub const FALLBACK_MESSAGE: &str = "Cannot access key vault. Set up Managed Identity!!!";

/// Where to find the secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    pub vault_uri: String,
    pub secret_name: String,
}

impl ResolverConfig {
    pub fn new(vault_uri: impl Into<String>, secret_name: impl Into<String>) -> Self {
        Self {
            vault_uri: vault_uri.into(),
            secret_name: secret_name.into(),
        }
    }
}

impl From<&EnvironmentConfig> for ResolverConfig {
    fn from(env: &EnvironmentConfig) -> Self {
        Self::new(env.vault_uri.clone(), env.secret_name.clone())
    }
}

/// Outcome of the startup lookup. Never changes after it is produced.
#[derive(Clone, PartialEq, Eq)]
pub enum ResolvedSecret {
    Value(String),
    Fallback(String),
}

impl ResolvedSecret {
    pub fn fallback() -> Self {
        Self::Fallback(FALLBACK_MESSAGE.to_string())
    }

    /// Text to serve: the secret itself or the fallback message.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Value(v) | Self::Fallback(v) => v,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

impl fmt::Debug for ResolvedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(_) => f.write_str("Value(<redacted>)"),
            Self::Fallback(msg) => f.debug_tuple("Fallback").field(msg).finish(),
        }
    }
}

/// Builds the Key Vault client from ambient credentials and reads one secret.
pub struct SecretResolver {
    credential: Arc<dyn TokenCredential>,
    http: reqwest::Client,
    policy: RetryPolicy,
}

impl SecretResolver {
    pub fn new(credential: Arc<dyn TokenCredential>, http: reqwest::Client) -> Self {
        Self {
            credential,
            http,
            policy: RetryPolicy::KEY_VAULT,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Resolve the configured secret. Never fails; errors become
    /// [`ResolvedSecret::Fallback`].
    ///
    /// An unusable vault URI falls back immediately without spending
    /// retry budget.
    #[instrument(skip_all, fields(vault_uri = %config.vault_uri, secret_name = %config.secret_name))]
    pub async fn resolve(&self, config: &ResolverConfig) -> ResolvedSecret {
        let client = match KeyVaultClient::new(
            &config.vault_uri,
            self.credential.clone(),
            self.http.clone(),
        ) {
            Ok(client) => client,
            Err(e) => {
                tracing::error!(error = %e, "Cannot build key vault client");
                return ResolvedSecret::fallback();
            }
        };

        fetch_with_retry(&client, &config.secret_name, &self.policy).await
    }
}

/// Read `name` from `store`, retrying every failure per `policy`.
pub async fn fetch_with_retry(
    store: &dyn SecretStore,
    name: &str,
    policy: &RetryPolicy,
) -> ResolvedSecret {
    match retry_with_backoff(policy, |_| store.get_secret(name)).await {
        Ok(secret) => {
            tracing::info!(secret_name = %name, "Secret resolved");
            ResolvedSecret::Value(secret.value)
        }
        Err(e) => {
            tracing::warn!(
                secret_name = %name,
                attempts = e.attempts,
                error = %e.last_error,
                "Serving fallback message"
            );
            ResolvedSecret::fallback()
        }
    }
}
