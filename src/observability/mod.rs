//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, request ID in span)
//!     → metrics.rs (counters, histograms)
//!     → audit.rs   (pre/post records in the counter store, metered routes only)
//!
//! Consumers:
//!     → Log aggregation (stdout, JSON or human-readable)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every log line of a request
//! - Metrics are cheap and disabled unless an exporter is installed
//! - Audit writes are best-effort and never fail a request

pub mod audit;
pub mod logging;
pub mod metrics;

pub use audit::{audit_middleware, AuditLogger, AuditPayload, AuditPhase};
