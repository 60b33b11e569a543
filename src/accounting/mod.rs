//! Request accounting.
//!
//! Every call to a metered endpoint bumps a per-API-key counter in the shared
//! counter store and hands the new count to the threshold policy in
//! `security::rate_limit`.

pub mod counter;

pub use counter::{RequestAccounting, DEFAULT_TOKEN};
