//! Key-value counter store.
//!
//! # Data Flow
//! ```text
//! accounting (INCR <apiKey>) ──┐
//!                              ├─▶ KeyValueStore ─┬─▶ redis_store.rs (shared, production)
//! audit (SET <ts>_logs ...) ───┘                  └─▶ memory.rs      (process-local, tests/dev)
//! ```
//!
//! # Design Decisions
//! - One async trait so handlers never know which backend they talk to
//! - Increments are atomic in both backends (Redis INCR, DashMap entry lock)
//! - Every backend call is bounded; timeouts surface as `StoreError::Timeout`

pub mod memory;
pub mod redis_store;

use async_trait::async_trait;
use thiserror::Error;

use crate::resilience::TimeoutError;

pub use self::memory::InMemoryStore;
pub use self::redis_store::RedisCounterStore;

/// Errors that can occur while talking to the counter store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or rejected the command.
    #[error("counter store unavailable: {0}")]
    Unavailable(String),

    /// The store did not answer within its deadline.
    #[error(transparent)]
    Timeout(#[from] TimeoutError),

    /// A key holds something that is not a non-negative integer.
    #[error("key '{key}' holds a non-counter value")]
    InvalidValue { key: String },
}

/// Result type for counter store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Abstract storage interface for counter entries and audit records.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value stored at `key`.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Overwrite `key` with `value`.
    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Atomically add one to the integer at `key` (missing counts as 0) and
    /// return the new value.
    async fn incr(&self, key: &str) -> StoreResult<u64>;
}
