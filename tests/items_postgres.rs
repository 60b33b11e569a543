//! Integration tests for the PostgreSQL item store.
//!
//! These tests require a PostgreSQL instance reachable through the usual
//! `DATABASE_HOST`, `DATABASE_PORT`, `DATABASE_NAME`, `DATABASE_USER` and
//! `DATABASE_PASSWORD` variables. They drop and recreate the `items` table.
//! Tests are ignored by default - run with `cargo test --test items_postgres -- --ignored`

use gated_api::config::loader;
use gated_api::config::DatabaseConfig;
use gated_api::items::{DbError, ItemStore, NewItem, PostgresItemStore};
use gated_api::ServiceConfig;
use tokio::sync::Mutex;

// Every test resets the same table.
static TABLE: Mutex<()> = Mutex::const_new(());

fn database_config() -> Option<DatabaseConfig> {
    if std::env::var("DATABASE_HOST").is_err() {
        eprintln!("Skipping test: DATABASE_HOST not set");
        return None;
    }
    let config =
        loader::apply_env_overrides(ServiceConfig::default(), |var| std::env::var(var).ok())
            .ok()?;
    Some(config.database)
}

async fn connect() -> Option<(PostgresItemStore, DatabaseConfig)> {
    let config = database_config()?;
    let store = PostgresItemStore::new(&config);
    match store.list_items().await {
        Err(e @ (DbError::Connect(_) | DbError::Timeout(_))) => {
            eprintln!("Skipping test: PostgreSQL not available ({})", e);
            None
        }
        _ => Some((store, config)),
    }
}

async fn drop_table(config: &DatabaseConfig) {
    let mut pg = tokio_postgres::Config::new();
    pg.host(&config.host)
        .port(config.port)
        .dbname(&config.name)
        .user(&config.user);
    if let Some(password) = &config.password {
        pg.password(password.expose());
    }
    let (client, connection) = pg.connect(tokio_postgres::NoTls).await.unwrap();
    tokio::spawn(connection);
    client.batch_execute("DROP TABLE IF EXISTS items").await.unwrap();
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn test_init_list_and_add() {
    let _guard = TABLE.lock().await;
    let Some((store, _)) = connect().await else { return };

    store.init_schema().await.unwrap();
    let items = store.list_items().await.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].name, "My First Item");
    assert_eq!(items[1].description.as_deref(), Some("This is another sample item."));

    let added = store
        .add_item(NewItem::new("Third", Some("from the test")))
        .await
        .unwrap();
    assert!(added.id > items[1].id);
    let bare = store.add_item(NewItem::new("Bare", None)).await.unwrap();

    let items = store.list_items().await.unwrap();
    assert_eq!(items.len(), 4);
    assert!(items.contains(&added));
    assert!(items.iter().any(|item| item.id == bare.id && item.description.is_none()));
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn test_init_discards_previous_rows() {
    let _guard = TABLE.lock().await;
    let Some((store, _)) = connect().await else { return };

    store.init_schema().await.unwrap();
    store.add_item(NewItem::new("extra", None)).await.unwrap();
    store.init_schema().await.unwrap();

    let items = store.list_items().await.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].id, 1);
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn test_missing_table_is_a_query_error() {
    let _guard = TABLE.lock().await;
    let Some((store, config)) = connect().await else { return };

    drop_table(&config).await;
    let err = store.list_items().await.unwrap_err();
    assert!(matches!(err, DbError::Query(_)), "unexpected error: {:?}", err);
    assert!(err.to_string().contains("items"));

    let err = store.add_item(NewItem::new("X", None)).await.unwrap_err();
    assert!(matches!(err, DbError::Query(_)));

    store.init_schema().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn test_failed_statements_release_connections() {
    let _guard = TABLE.lock().await;
    let Some((store, config)) = connect().await else { return };

    drop_table(&config).await;
    // More failures than the server's default connection limit of 100.
    for _ in 0..150 {
        let err = store.list_items().await.unwrap_err();
        assert!(matches!(err, DbError::Query(_)), "unexpected error: {:?}", err);
        tokio::task::yield_now().await;
    }

    store.init_schema().await.unwrap();
    assert_eq!(store.list_items().await.unwrap().len(), 2);
}
