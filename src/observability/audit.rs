//! Audit records for metered endpoints.
//!
//! Two records are written to the counter store per admitted request:
//!
//! ```text
//! <YYYYmmddHHMMSS>_logs                     → "this is just a logging example"
//! <YYYYmmddHHMMSS>_after_logs_query_params  → {"query_params": {...}, "result": {...}}
//! ```
//!
//! Keys have one-second resolution; two requests in the same second overwrite
//! each other's records. Writes are best-effort: a failed write is logged and
//! counted, never returned to the caller.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Query, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;

use crate::http::request::RequestIdExt;
use crate::http::response::ApiError;
use crate::observability::metrics;
use crate::store::KeyValueStore;

/// Value of every pre-call record.
pub const PRE_CALL_MARKER: &str = "this is just a logging example";

const PRE_SUFFIX: &str = "_logs";
const POST_SUFFIX: &str = "_after_logs_query_params";
const KEY_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Snapshot written after the handler produced its result.
#[derive(Debug, Clone, Serialize)]
pub struct AuditPayload {
    pub query_params: BTreeMap<String, String>,
    pub result: Value,
}

/// Which side of the handler a record describes.
#[derive(Debug, Clone)]
pub enum AuditPhase {
    Pre,
    Post(AuditPayload),
}

impl AuditPhase {
    fn label(&self) -> &'static str {
        match self {
            AuditPhase::Pre => "pre",
            AuditPhase::Post(_) => "post",
        }
    }
}

/// Store key for a record of `phase` written at `timestamp`.
pub fn audit_key(phase: &AuditPhase, timestamp: &str) -> String {
    match phase {
        AuditPhase::Pre => format!("{}{}", timestamp, PRE_SUFFIX),
        AuditPhase::Post(_) => format!("{}{}", timestamp, POST_SUFFIX),
    }
}

fn now_stamp() -> String {
    chrono::Local::now().format(KEY_TIMESTAMP_FORMAT).to_string()
}

/// Fire-and-forget writer of audit records.
#[derive(Clone)]
pub struct AuditLogger {
    store: Arc<dyn KeyValueStore>,
    enabled: bool,
}

impl AuditLogger {
    pub fn new(store: Arc<dyn KeyValueStore>, enabled: bool) -> Self {
        Self { store, enabled }
    }

    /// Write one record. Never fails; problems are logged and counted.
    pub async fn record(&self, phase: AuditPhase) {
        if !self.enabled {
            return;
        }

        let label = phase.label();
        let key = audit_key(&phase, &now_stamp());
        let value = match phase {
            AuditPhase::Pre => PRE_CALL_MARKER.to_string(),
            AuditPhase::Post(payload) => match serde_json::to_string(&payload) {
                Ok(json) => json,
                Err(e) => {
                    tracing::warn!(phase = label, error = %e, "Failed to serialize audit record");
                    metrics::record_audit_failure(label);
                    return;
                }
            },
        };

        match self.store.set(&key, &value).await {
            Ok(()) => tracing::trace!(phase = label, key = %key, "Audit record written"),
            Err(e) => {
                tracing::warn!(phase = label, key = %key, error = %e, "Audit write failed");
                metrics::record_audit_failure(label);
            }
        }
    }
}

/// Write the pre-call marker, run the handler, then write the post-call payload.
///
/// The post record is only written for successful responses; a rejected call
/// (e.g. 429) leaves just the pre-call marker behind.
pub async fn audit_middleware(
    State(audit): State<AuditLogger>,
    Query(pairs): Query<Vec<(String, String)>>,
    request: Request,
    next: Next,
) -> Response {
    // First occurrence of a repeated parameter wins, as in the gate.
    let mut query_params = BTreeMap::new();
    for (key, value) in pairs {
        query_params.entry(key).or_insert(value);
    }

    let request_id = request.request_id().to_string();
    audit.record(AuditPhase::Pre).await;

    let response = next.run(request).await;
    if !response.status().is_success() {
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return ApiError::Internal(format!("failed to buffer response body: {}", e))
                .into_response();
        }
    };

    let result = serde_json::from_slice::<Value>(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    tracing::debug!(request_id = %request_id, "Recording post-call audit payload");
    audit
        .record(AuditPhase::Post(AuditPayload {
            query_params,
            result,
        }))
        .await;

    Response::from_parts(parts, Body::from(bytes))
}
