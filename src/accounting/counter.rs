//! Per-key request counter.

use std::sync::Arc;

use crate::store::{KeyValueStore, StoreResult};

/// Token charged when a handler runs without an `apiKey` parameter.
///
/// The access gate normally rejects such requests first, so this only shows
/// up when a metered handler is mounted without the gate.
pub const DEFAULT_TOKEN: &str = "default";

/// Counts calls per credential token.
#[derive(Clone)]
pub struct RequestAccounting {
    store: Arc<dyn KeyValueStore>,
}

impl RequestAccounting {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Record one more call for `token` and return the updated count.
    ///
    /// A token seen for the first time returns 1. Sequential calls for the
    /// same token return strictly increasing values.
    pub async fn increment_and_get(&self, token: &str) -> StoreResult<u64> {
        let count = self.store.incr(token).await?;
        tracing::debug!(call_count = count, "Request counted");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryStore, StoreError};

    #[tokio::test]
    async fn test_sequential_calls_count_up_from_one() {
        let accounting = RequestAccounting::new(Arc::new(InMemoryStore::new()));
        let mut seen = Vec::new();
        for _ in 0..5 {
            seen.push(accounting.increment_and_get("fresh-token").await.unwrap());
        }
        assert_eq!(seen, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_tokens_are_counted_independently() {
        let accounting = RequestAccounting::new(Arc::new(InMemoryStore::new()));
        accounting.increment_and_get("a").await.unwrap();
        accounting.increment_and_get("a").await.unwrap();
        assert_eq!(accounting.increment_and_get("b").await.unwrap(), 1);
        assert_eq!(accounting.increment_and_get(DEFAULT_TOKEN).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_store_outage_is_reported() {
        let store = InMemoryStore::new();
        store.set_available(false);
        let accounting = RequestAccounting::new(Arc::new(store));
        assert!(matches!(
            accounting.increment_and_get("a").await,
            Err(StoreError::Unavailable(_))
        ));
    }
}
