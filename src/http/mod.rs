//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace, timeout)
//!     → GET /          → static greeting
//!     → GET /keyvault  → ResolvedSecret from AppState
//! ```

pub mod server;

pub use server::{AppState, HttpServer, GREETING};
