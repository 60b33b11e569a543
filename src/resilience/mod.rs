//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to counter store or database:
//!     → timeouts.rs (enforce per-call deadline)
//!     → On timeout: caller maps to StoreUnavailable / DatabaseUnavailable (500)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - No retries: a failed store call surfaces to the client directly

pub mod timeouts;

pub use timeouts::{with_timeout, TimeoutError};
