//! Access Control Middleware.
//! Requires a non-empty `apiKey` query parameter on gated routes.

use axum::{
    extract::{Query, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::request::RequestIdExt;
use crate::http::response::ApiError;
use crate::observability::metrics;

/// Query parameter carrying the caller's credential.
pub const API_KEY_PARAM: &str = "apiKey";

/// Value of the first `name` parameter in query order.
///
/// Later repetitions are ignored, so `?apiKey=abc&apiKey=` carries `abc`.
pub fn first_param<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

/// Check that a credential was supplied. The value itself is not verified.
pub fn authorize(credential: Option<&str>) -> Result<(), ApiError> {
    match credential {
        Some(token) if !token.is_empty() => Ok(()),
        _ => Err(ApiError::Unauthorized),
    }
}

/// Reject requests without a usable `apiKey` before any other stage runs.
pub async fn access_gate(
    Query(params): Query<Vec<(String, String)>>,
    request: Request,
    next: Next,
) -> Response {
    let credential = first_param(&params, API_KEY_PARAM);

    if let Err(rejection) = authorize(credential) {
        tracing::warn!(
            request_id = %request.request_id(),
            path = %request.uri().path(),
            api_key_present = credential.is_some(),
            "Missing or empty apiKey"
        );
        metrics::record_rejection("unauthorized");
        return rejection.into_response();
    }

    next.run(request).await
}
