//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config/appsettings.json (or TOML, or built-in defaults)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → EnvironmentConfig feeds the secret resolver once at startup
//! ```
//!
//! # Design Decisions
//! - Config is read once; there is no reload path
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, ConfigError, DEFAULT_CONFIG_PATH};
pub use schema::AppConfig;
pub use schema::EnvironmentConfig;
pub use schema::ListenerConfig;
pub use schema::LoggingConfig;
