//! Redis-backed counter store.
//!
//! Counter entries are plain Redis strings holding a decimal integer, keyed by
//! the caller's API key. Audit records share the same keyspace.
//!
//! ## Features
//!
//! - Connection multiplexing and reconnects via `redis::aio::ConnectionManager`
//! - Lazy connect: the first command dials Redis, so an outage at startup
//!   only fails the requests that need the store
//! - Atomic increments with `INCR`, so concurrent callers never lose an update
//! - Every command bounded by `counter_store.timeout_ms`

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError};
use tokio::sync::OnceCell;

use super::{KeyValueStore, StoreError, StoreResult};
use crate::config::CounterStoreConfig;
use crate::resilience::with_timeout;

impl From<RedisError> for StoreError {
    fn from(e: RedisError) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

/// Redis-backed storage shared across service instances.
#[derive(Clone)]
pub struct RedisCounterStore {
    client: Client,
    connection: Arc<OnceCell<ConnectionManager>>,
    timeout: Duration,
}

impl fmt::Debug for RedisCounterStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCounterStore")
            .field("timeout", &self.timeout)
            .field("connected", &self.connection.initialized())
            .finish_non_exhaustive()
    }
}

impl RedisCounterStore {
    /// Build a store from the counter store configuration without dialing Redis.
    ///
    /// # Errors
    /// Returns error if the URL is malformed.
    pub fn new(config: &CounterStoreConfig) -> StoreResult<Self> {
        let client = Client::open(config.url.as_str())?;
        Ok(Self {
            client,
            connection: Arc::new(OnceCell::new()),
            timeout: Duration::from_millis(config.timeout_ms),
        })
    }

    /// Build a store and dial Redis immediately.
    ///
    /// # Errors
    /// Returns error if the URL is malformed or the first connection fails
    /// within the configured deadline.
    pub async fn connect(config: &CounterStoreConfig) -> StoreResult<Self> {
        let store = Self::new(config)?;
        store.connection().await?;
        Ok(store)
    }

    /// Shared connection, dialed on first use. A failed dial is retried by the next caller.
    async fn connection(&self) -> StoreResult<ConnectionManager> {
        let connection = self
            .connection
            .get_or_try_init(|| async {
                let client = self.client.clone();
                let connection = with_timeout("redis connect", self.timeout, async move {
                    ConnectionManager::new(client).await.map_err(StoreError::from)
                })
                .await?;
                tracing::info!(timeout_ms = self.timeout.as_millis() as u64, "Connected to counter store");
                Ok::<_, StoreError>(connection)
            })
            .await?;
        Ok(connection.clone())
    }
}

#[async_trait]
impl KeyValueStore for RedisCounterStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.connection().await?;
        with_timeout("redis GET", self.timeout, async move {
            let value: Option<String> = conn.get(key).await?;
            Ok::<_, StoreError>(value)
        })
        .await
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut conn = self.connection().await?;
        with_timeout("redis SET", self.timeout, async move {
            conn.set::<_, _, ()>(key, value).await?;
            Ok::<_, StoreError>(())
        })
        .await
    }

    async fn incr(&self, key: &str) -> StoreResult<u64> {
        let mut conn = self.connection().await?;
        let value: i64 = with_timeout("redis INCR", self.timeout, async move {
            let value: i64 = conn.incr(key, 1).await?;
            Ok::<_, StoreError>(value)
        })
        .await?;

        u64::try_from(value).map_err(|_| StoreError::InvalidValue {
            key: key.to_string(),
        })
    }
}
