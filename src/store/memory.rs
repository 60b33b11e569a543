//! Process-local store used for development and tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use super::{KeyValueStore, StoreError, StoreResult};

/// A thread-safe in-memory key-value store.
///
/// Cloning shares the underlying map.
#[derive(Clone, Debug)]
pub struct InMemoryStore {
    inner: Arc<DashMap<String, String>>,
    available: Arc<AtomicBool>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Simulate an outage: every call fails with `StoreError::Unavailable`
    /// until availability is restored.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// All keys ending with `suffix`, sorted.
    pub fn keys_with_suffix(&self, suffix: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .inner
            .iter()
            .filter(|entry| entry.key().ends_with(suffix))
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        keys
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("in-memory store is offline".to_string()))
        }
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.check_available()?;
        Ok(self.inner.get(key).map(|r| r.value().clone()))
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.check_available()?;
        self.inner.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn incr(&self, key: &str) -> StoreResult<u64> {
        self.check_available()?;
        // The entry guard holds the shard lock, so concurrent increments serialize.
        let mut entry = self.inner.entry(key.to_string()).or_insert_with(|| "0".to_string());
        let current: u64 = entry.value().parse().map_err(|_| StoreError::InvalidValue {
            key: key.to_string(),
        })?;
        let next = current + 1;
        *entry.value_mut() = next.to_string();
        Ok(next)
    }
}
