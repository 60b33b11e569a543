//! Items API: CRUD over the `items` table in PostgreSQL.
//!
//! Connection settings come from the config file and the `DATABASE_HOST`,
//! `DATABASE_PORT`, `DATABASE_NAME`, `DATABASE_USER` and `DATABASE_PASSWORD`
//! environment variables. The password is only ever read from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use gated_api::config::loader;
use gated_api::items::{ItemsState, PostgresItemStore};
use gated_api::lifecycle::{spawn_signal_listener, Shutdown};
use gated_api::observability::{logging, metrics};
use gated_api::HttpServer;

#[derive(Parser)]
#[command(name = "items-api")]
#[command(about = "Items CRUD API backed by PostgreSQL", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `items.bind_address`.
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Expose `/init_db` regardless of the config file. Destroys all rows.
    #[arg(long)]
    allow_init_db: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut config = loader::load(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.items.bind_address = bind.to_string();
    }
    if cli.allow_init_db {
        config.items.allow_init_db = true;
    }

    logging::init_logging(&config.observability);
    tracing::info!("items-api v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    if config.database.password.is_none() {
        tracing::warn!("DATABASE_PASSWORD is not set; connecting without a password");
    }
    if config.items.allow_init_db {
        tracing::warn!("/init_db is enabled: any caller can drop the items table");
    }

    let state = ItemsState {
        store: Arc::new(PostgresItemStore::new(&config.database)),
        allow_init_db: config.items.allow_init_db,
    };

    let listener = TcpListener::bind(&config.items.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        database_host = %config.database.host,
        database_name = %config.database.name,
        "Listening for connections"
    );

    let shutdown = Arc::new(Shutdown::new());
    spawn_signal_listener(shutdown.clone());

    HttpServer::items(&config, state)
        .run(listener, shutdown.subscribe())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
