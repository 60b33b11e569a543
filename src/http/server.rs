//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Wrap a service router with the shared middleware stack
//!   (request ID, tracing, timeout, metrics, security headers, 404 fallback)
//! - Bind the server to a listener
//! - Drain in-flight requests on shutdown

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, StatusCode},
    middleware,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    limit::RequestBodyLimitLayer,
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
};

use crate::config::ServiceConfig;
use crate::http::request::with_request_id;
use crate::http::response::not_found;
use crate::items::{setup_items_router, ItemsState};
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;
use crate::weather::{setup_weather_router, WeatherState};

/// An HTTP server for one of the two services.
pub struct HttpServer {
    name: &'static str,
    router: Router,
}

impl HttpServer {
    /// The gated weather/customer API.
    pub fn weather(config: &ServiceConfig, state: WeatherState) -> Self {
        Self {
            name: "weather-api",
            router: Self::build_router(config, setup_weather_router(state)),
        }
    }

    /// The items CRUD API.
    pub fn items(config: &ServiceConfig, state: ItemsState) -> Self {
        let routes = setup_items_router(state)
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size));
        Self {
            name: "items-api",
            router: Self::build_router(config, routes),
        }
    }

    /// Wrap service routes with all shared middleware layers.
    fn build_router(config: &ServiceConfig, routes: Router) -> Router {
        let mut router = routes
            .fallback(not_found)
            .layer(middleware::from_fn(metrics::track_metrics))
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                Duration::from_secs(config.timeouts.request_secs),
            ));

        if config.security.enable_headers {
            router = router.layer(SetResponseHeaderLayer::if_not_present(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ));
        }

        with_request_id(router)
    }

    /// Service name used in logs.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The fully layered router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            service = self.name,
            address = %addr,
            "HTTP server starting"
        );

        let name = self.name;
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.recv().await;
                tracing::info!(service = name, "Draining connections");
            })
            .await?;

        tracing::info!(service = self.name, "HTTP server stopped");
        Ok(())
    }
}
