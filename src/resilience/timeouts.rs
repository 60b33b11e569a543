//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap counter store and database calls with a deadline
//! - Cancel operations cleanly on timeout
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors
//! - Callers convert the timeout into their own error type via `From`

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// An external call did not finish within its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{operation} timed out after {limit:?}")]
pub struct TimeoutError {
    pub operation: &'static str,
    pub limit: Duration,
}

/// Run `fut` with a deadline of `limit`.
///
/// The inner future is dropped when the deadline passes.
pub async fn with_timeout<F, T, E>(operation: &'static str, limit: Duration, fut: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<TimeoutError>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(operation, limit_ms = limit.as_millis() as u64, "External call timed out");
            Err(TimeoutError { operation, limit }.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Timeout(TimeoutError),
    }

    impl From<TimeoutError> for TestError {
        fn from(e: TimeoutError) -> Self {
            TestError::Timeout(e)
        }
    }

    #[tokio::test]
    async fn test_fast_call_passes_through() {
        let result: Result<u32, TestError> =
            with_timeout("fast", Duration::from_secs(1), async { Ok(7) }).await;
        assert_eq!(result, Ok(7));
    }

    #[tokio::test]
    async fn test_slow_call_times_out() {
        let result: Result<u32, TestError> = with_timeout("slow", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(1)
        })
        .await;

        let TestError::Timeout(err) = result.unwrap_err();
        assert_eq!(err.operation, "slow");
        assert_eq!(err.to_string(), "slow timed out after 10ms");
    }
}
