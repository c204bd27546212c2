//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Vault URI must be usable before any lookup is attempted
//! - Secret name must follow Key Vault naming rules
//! - Validate value ranges (timeouts > 0, bind address parses)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::secrets::client::parse_vault_uri;

/// Longest secret name Key Vault accepts.
const MAX_SECRET_NAME_LEN: usize = 127;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("EnvironmentConfig.VaultUri: {0}")]
    VaultUri(String),

    #[error("EnvironmentConfig.DBCredentials: '{0}' is not a valid secret name")]
    SecretName(String),

    #[error("Listener.BindAddress: '{0}' is not a socket address")]
    BindAddress(String),

    #[error("Timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),
}

/// Key Vault secret names: 1-127 characters, ASCII alphanumerics and dashes.
pub fn is_valid_secret_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_SECRET_NAME_LEN
        && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = parse_vault_uri(&config.environment_config.vault_uri) {
        errors.push(ValidationError::VaultUri(e.to_string()));
    }

    if !is_valid_secret_name(&config.environment_config.secret_name) {
        errors.push(ValidationError::SecretName(
            config.environment_config.secret_name.clone(),
        ));
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("RequestSecs"));
    }
    if config.timeouts.vault_request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("VaultRequestSecs"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
