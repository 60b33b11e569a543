//! Weather and customer demo service.
//!
//! ```text
//! GET /               → HTML greeting
//! GET /api/customers  → gate → handler
//! GET /api/weather    → gate → audit(pre) → accounting → threshold → audit(post)
//! ```

pub mod handlers;

use axum::{middleware, routing::get, Router};

use self::handlers::*;
use crate::accounting::RequestAccounting;
use crate::observability::{audit_middleware, AuditLogger};
use crate::security::access_gate;

/// State injected into weather handlers.
#[derive(Clone)]
pub struct WeatherState {
    pub accounting: RequestAccounting,
    pub audit: AuditLogger,
}

pub fn setup_weather_router(state: WeatherState) -> Router {
    // Layers run outermost-last: the gate wraps the audit stage.
    let metered = Router::new()
        .route("/api/weather", get(get_weather))
        .layer(middleware::from_fn_with_state(
            state.audit.clone(),
            audit_middleware,
        ))
        .layer(middleware::from_fn(access_gate));

    let gated = Router::new()
        .route("/api/customers", get(get_customers))
        .layer(middleware::from_fn(access_gate));

    Router::new()
        .route("/", get(index))
        .merge(metered)
        .merge(gated)
        .with_state(state)
}
