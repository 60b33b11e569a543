//! Response handling and error mapping.
//!
//! # Responsibilities
//! - Map domain errors to HTTP status codes
//! - Render every failure as a flat JSON object `{"error": ..., "message"?: ...}`
//! - Provide the router fallback for unmatched paths
//!
//! # Design Decisions
//! - Diagnostics for 500s are logged here, once, at the boundary
//! - Database connection details never leak into the response body

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::items::store::DbError;
use crate::security::rate_limit::RateLimited;
use crate::store::StoreError;

/// Body of the 404 fallback.
pub const NOT_FOUND_MESSAGE: &str = "Huy wala naman yun hinahanap mo";

/// Body of a rejected `POST /items`.
pub const MISSING_NAME_MESSAGE: &str = "Invalid request. 'name' is required.";

/// Flat JSON error body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorBody {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: None,
        }
    }

    fn with_message(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: Some(message.into()),
        }
    }
}

/// Errors surfaced to HTTP clients.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or empty `apiKey`.
    #[error("unauthorized")]
    Unauthorized,

    /// The caller's call count exceeded the threshold.
    #[error(transparent)]
    RateLimited(#[from] RateLimited),

    /// No route matched.
    #[error("not found")]
    NotFound,

    /// A required field is missing from the request.
    #[error("{0}")]
    Validation(String),

    /// The endpoint exists but is switched off on this instance.
    #[error("{0}")]
    Forbidden(String),

    /// The counter store could not serve the request.
    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),

    /// The database could not be reached.
    #[error("database unavailable: {0}")]
    DatabaseUnavailable(String),

    /// The database rejected a statement.
    #[error("database error: {0}")]
    Database(String),

    /// Anything else that should never reach a client in detail.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::StoreUnavailable(_)
            | ApiError::DatabaseUnavailable(_)
            | ApiError::Database(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody {
        match self {
            ApiError::Unauthorized => ErrorBody::with_message(
                "unauthorized",
                "a non-empty apiKey query parameter is required",
            ),
            ApiError::RateLimited(_) => ErrorBody::with_message(
                "ratelimit exceeded",
                "You have exceeded your request rate",
            ),
            ApiError::NotFound => ErrorBody::new(NOT_FOUND_MESSAGE),
            ApiError::Validation(message) | ApiError::Forbidden(message) => {
                ErrorBody::new(message.clone())
            }
            ApiError::StoreUnavailable(e) => {
                ErrorBody::with_message("counter store unavailable", e.to_string())
            }
            ApiError::DatabaseUnavailable(_) => ErrorBody::new("Database connection failed"),
            ApiError::Database(detail) => ErrorBody::new(format!("An error occurred: {}", detail)),
            ApiError::Internal(_) => ErrorBody::new("internal server error"),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Connect(detail) => ApiError::DatabaseUnavailable(detail),
            DbError::Timeout(t) => ApiError::DatabaseUnavailable(t.to_string()),
            DbError::Query(detail) => ApiError::Database(detail),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        }
        (status, Json(self.body())).into_response()
    }
}

/// Router fallback for unmatched paths.
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::TimeoutError;
    use std::time::Duration;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::RateLimited(RateLimited { count: 13, limit: 12 }).status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Validation(MISSING_NAME_MESSAGE.into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::StoreUnavailable(StoreError::Unavailable("down".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_rate_limit_body() {
        let body = ApiError::RateLimited(RateLimited { count: 13, limit: 12 }).body();
        assert_eq!(body.error, "ratelimit exceeded");
        assert_eq!(body.message.as_deref(), Some("You have exceeded your request rate"));
    }

    #[test]
    fn test_not_found_body_has_no_message() {
        let json = serde_json::to_value(ApiError::NotFound.body()).unwrap();
        assert_eq!(json, serde_json::json!({ "error": NOT_FOUND_MESSAGE }));
    }

    #[test]
    fn test_db_errors_hide_connection_details() {
        let err = ApiError::from(DbError::Connect("password authentication failed".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.body(), ErrorBody::new("Database connection failed"));

        let err = ApiError::from(DbError::Timeout(TimeoutError {
            operation: "database connect",
            limit: Duration::from_secs(5),
        }));
        assert!(matches!(err, ApiError::DatabaseUnavailable(_)));

        let err = ApiError::from(DbError::Query("relation \"items\" does not exist".into()));
        assert_eq!(
            err.body().error,
            "An error occurred: relation \"items\" does not exist"
        );
    }
}
