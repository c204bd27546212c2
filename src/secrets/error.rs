//! Secret lookup error types.
//!
//! None of these reach an HTTP client: the resolver logs them and folds
//! terminal failures into the fallback message.

use thiserror::Error;

/// Errors raised while acquiring credentials or reading a secret.
#[derive(Debug, Error)]
pub enum SecretError {
    /// No credential source is configured for this environment.
    #[error("no credential available: {0}")]
    CredentialUnavailable(String),

    /// A credential source was found but refused to issue a token.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Key Vault rejected the token (401/403).
    #[error("access to key vault denied (status {0})")]
    Unauthorized(u16),

    /// The secret does not exist in the vault.
    #[error("secret not found: {0}")]
    NotFound(String),

    /// Key Vault asked us to back off (429).
    #[error("key vault throttled the request")]
    Throttled,

    /// Key Vault returned a server error or an unexpected status.
    #[error("key vault service error (status {0})")]
    Service(u16),

    /// Transport failure talking to Key Vault or an identity endpoint.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A response body did not have the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The vault endpoint is not a usable URI.
    #[error("invalid vault uri '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },
}

impl SecretError {
    pub(crate) fn invalid_uri(uri: &str, reason: impl Into<String>) -> Self {
        Self::InvalidUri {
            uri: uri.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for secret operations.
pub type SecretResult<T> = Result<T, SecretError>;
