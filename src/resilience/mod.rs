//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Secret lookup at startup:
//!     → retries.rs (run attempt, on error sleep and try again)
//!     → backoff.rs (delay = initial * 2^(n-1), capped)
//!     → budget exhausted: caller decides the fallback
//! ```
//!
//! # Design Decisions
//! - Backoff is deterministic so the schedule can be asserted on a paused clock
//! - The retry loop does not classify errors; every failure spends budget

pub mod backoff;
pub mod retries;

pub use retries::{retry_with_backoff, RetryError, RetryPolicy};
