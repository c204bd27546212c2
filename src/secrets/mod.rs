//! Secret retrieval subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     credential.rs (ambient identity → bearer token)
//!     → client.rs (GET {vault}/secrets/{name})
//!     → resolver.rs (retry with backoff, fold failure into fallback)
//!     → ResolvedSecret handed to the HTTP layer
//! ```
//!
//! # Design Decisions
//! - Resolution runs once; the result is never refreshed
//! - Failure causes are logged, never served; clients only see the fallback text
//! - Credentials are a trait object so tests and other hosts can swap them

pub mod client;
pub mod credential;
pub mod error;
pub mod resolver;

pub use client::{KeyVaultClient, KeyVaultSecret, SecretStore};
pub use credential::{AccessToken, DefaultCredential, Env, TokenCredential};
pub use error::{SecretError, SecretResult};
pub use resolver::{ResolvedSecret, ResolverConfig, SecretResolver, FALLBACK_MESSAGE};
