//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;

use gated_api::accounting::RequestAccounting;
use gated_api::items::{InMemoryItemStore, ItemsState};
use gated_api::observability::AuditLogger;
use gated_api::store::{InMemoryStore, KeyValueStore};
use gated_api::weather::WeatherState;
use gated_api::{HttpServer, ServiceConfig, Shutdown};
use tokio::net::TcpListener;

/// A server running on an ephemeral port. Stops when dropped.
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start the weather API over `store`.
#[allow(dead_code)]
pub async fn spawn_weather(store: InMemoryStore) -> TestServer {
    spawn_weather_on(Arc::new(store)).await
}

/// Start the weather API over any counter store backend.
#[allow(dead_code)]
pub async fn spawn_weather_on(store: Arc<dyn KeyValueStore>) -> TestServer {
    let config = ServiceConfig::default();
    let state = WeatherState {
        accounting: RequestAccounting::new(store.clone()),
        audit: AuditLogger::new(store, config.audit.enabled),
    };
    spawn(HttpServer::weather(&config, state)).await
}

/// Start the items API over `store`.
#[allow(dead_code)]
pub async fn spawn_items(store: Arc<InMemoryItemStore>, allow_init_db: bool) -> TestServer {
    let config = ServiceConfig::default();
    let state = ItemsState {
        store,
        allow_init_db,
    };
    spawn(HttpServer::items(&config, state)).await
}

async fn spawn(server: HttpServer) -> TestServer {
    // Bound before spawning, so early requests queue instead of failing.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, signal).await;
    });

    TestServer { addr, shutdown }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
