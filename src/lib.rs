//! Key Vault demo web app library.
//!
//! Reads one secret from Azure Key Vault at startup and serves it on
//! `/keyvault`, next to a static greeting on `/`.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod secrets;

pub use config::schema::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use secrets::{ResolvedSecret, SecretResolver};
