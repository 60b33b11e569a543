//! Weather API
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────────────┐
//!                       │                     WEATHER API                      │
//!   Client Request      │  ┌──────────┐   ┌──────────┐   ┌─────────────────┐   │
//!  ─────────────────────┼─▶│  access  │──▶│  audit   │──▶│   accounting    │───┼──▶ Redis
//!                       │  │   gate   │   │  (pre)   │   │  INCR <apiKey>  │   │   (counter
//!                       │  └────┬─────┘   └──────────┘   └────────┬────────┘   │    entries,
//!                       │       │ 401                             ▼            │    audit
//!                       │       │                        ┌─────────────────┐   │    records)
//!                       │       │                        │ threshold (12)  │   │
//!                       │       │                        └────────┬────────┘   │
//!   Client Response     │       ▼                                 ▼ 429 / 200  │
//!  ◀────────────────────┼──────────────────────────────── audit (post) ◀───────┼──
//!                       └──────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use gated_api::accounting::RequestAccounting;
use gated_api::config::loader;
use gated_api::lifecycle::{spawn_signal_listener, Shutdown};
use gated_api::observability::{logging, metrics, AuditLogger};
use gated_api::store::{KeyValueStore, RedisCounterStore};
use gated_api::weather::WeatherState;
use gated_api::HttpServer;

#[derive(Parser)]
#[command(name = "weather-api")]
#[command(about = "Weather and customer demo API with per-key call accounting", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `weather.bind_address`.
    #[arg(short, long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut config = loader::load(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.weather.bind_address = bind.to_string();
    }

    logging::init_logging(&config.observability);
    tracing::info!("weather-api v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    // Redis is dialed on first use; an outage fails /api/weather, not startup.
    let store: Arc<dyn KeyValueStore> = Arc::new(RedisCounterStore::new(&config.counter_store)?);
    let state = WeatherState {
        accounting: RequestAccounting::new(store.clone()),
        audit: AuditLogger::new(store, config.audit.enabled),
    };

    let listener = TcpListener::bind(&config.weather.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        request_timeout_secs = config.timeouts.request_secs,
        audit_enabled = config.audit.enabled,
        "Listening for connections"
    );

    let shutdown = Arc::new(Shutdown::new());
    spawn_signal_listener(shutdown.clone());

    HttpServer::weather(&config, state)
        .run(listener, shutdown.subscribe())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
