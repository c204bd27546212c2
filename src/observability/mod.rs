//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, stdout)
//! HTTP requests additionally carry:
//!     → x-request-id (set in http/server.rs, recorded by TraceLayer)
//! ```
//!
//! # Design Decisions
//! - Secret values never appear in log fields
//! - Retry attempts and failure causes are logged; HTTP clients never see them

pub mod logging;
