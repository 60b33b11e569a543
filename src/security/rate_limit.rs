//! Call-count threshold for metered endpoints.

use thiserror::Error;

use crate::observability::metrics;

/// Highest call count a single API key may reach and still be served.
pub const CALL_LIMIT: u64 = 12;

/// The caller has used up its allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("call count {count} exceeds limit {limit}")]
pub struct RateLimited {
    pub count: u64,
    pub limit: u64,
}

/// Admit calls up to and including [`CALL_LIMIT`].
pub fn check_call_limit(count: u64) -> Result<u64, RateLimited> {
    if count <= CALL_LIMIT {
        Ok(count)
    } else {
        tracing::warn!(call_count = count, limit = CALL_LIMIT, "Rate limit exceeded");
        metrics::record_rejection("rate_limited");
        Err(RateLimited {
            count,
            limit: CALL_LIMIT,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_is_inclusive() {
        assert_eq!(check_call_limit(1), Ok(1));
        assert_eq!(check_call_limit(CALL_LIMIT), Ok(CALL_LIMIT));
    }

    #[test]
    fn test_first_call_over_limit_is_rejected() {
        assert_eq!(
            check_call_limit(CALL_LIMIT + 1),
            Err(RateLimited { count: 13, limit: 12 })
        );
    }

    #[test]
    fn test_error_display() {
        let err = check_call_limit(20).unwrap_err();
        assert_eq!(err.to_string(), "call count 20 exceeds limit 12");
    }
}
