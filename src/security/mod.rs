//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request on a gated route:
//!     → access_control.rs (apiKey present and non-empty, else 401)
//!     → audit stage (metered routes only)
//!     → handler: accounting, then rate_limit.rs (count > 12 → 429)
//! ```
//!
//! # Design Decisions
//! - The gate runs first: a rejected request is never counted or audited
//! - Fail closed: reject on any security check failure

pub mod access_control;
pub mod rate_limit;

pub use access_control::{access_gate, authorize, first_param, API_KEY_PARAM};
pub use rate_limit::{check_call_limit, RateLimited, CALL_LIMIT};
