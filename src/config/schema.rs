//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the web app.
//! Keys use the PascalCase section layout of `appsettings.json` so the same
//! file works whether it is written as JSON or TOML.

use serde::{Deserialize, Serialize};

/// Default Key Vault endpoint used when no configuration file is present.
pub const DEFAULT_VAULT_URI: &str = "https://kv-abs.vault.azure.net/";

/// Default name of the secret exposed on `/keyvault`.
pub const DEFAULT_SECRET_NAME: &str = "db-credentials";

/// Root configuration for the web app.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, rename_all = "PascalCase")]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Key Vault location and the secret to read from it.
    pub environment_config: EnvironmentConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Log level and output format.
    pub logging: LoggingConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Key Vault settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Vault endpoint, e.g. `https://my-vault.vault.azure.net/`.
    #[serde(rename = "VaultUri")]
    pub vault_uri: String,

    /// Name of the secret holding the database credentials.
    #[serde(rename = "DBCredentials", alias = "DbCredentials")]
    pub secret_name: String,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            vault_uri: DEFAULT_VAULT_URI.to_string(),
            secret_name: DEFAULT_SECRET_NAME.to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct TimeoutConfig {
    /// Inbound request timeout in seconds.
    pub request_secs: u64,

    /// Per-call timeout for Key Vault and token endpoint requests, in seconds.
    pub vault_request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            vault_request_secs: 10,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,

    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}
