//! Item persistence.
//!
//! # Responsibilities
//! - Reset the `items` table and seed it with sample rows
//! - List every row, insert a row and return its surrogate id
//!
//! # Design Decisions
//! - One connection per operation; the client is dropped on every exit path,
//!   which closes the connection
//! - Each operation runs in at most one transaction (reset) or one statement
//! - Connection and statement deadlines come from `DatabaseConfig`

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio_postgres::{Client, NoTls};

use crate::config::DatabaseConfig;
use crate::items::model::{Item, NewItem, SAMPLE_ITEMS};
use crate::resilience::{with_timeout, TimeoutError};

const RESET_SCHEMA: &str = "DROP TABLE IF EXISTS items; \
     CREATE TABLE items (id SERIAL PRIMARY KEY, name VARCHAR(100) NOT NULL, description TEXT);";
const INSERT_ITEM: &str = "INSERT INTO items (name, description) VALUES ($1, $2) RETURNING id";
const SELECT_ITEMS: &str = "SELECT id, name, description FROM items";

/// Errors that can occur while talking to the item database.
#[derive(Debug, Error)]
pub enum DbError {
    /// The database could not be reached or refused the login.
    #[error("could not connect to database: {0}")]
    Connect(String),

    /// A statement failed.
    #[error("{0}")]
    Query(String),

    /// Connect or statement deadline passed.
    #[error(transparent)]
    Timeout(#[from] TimeoutError),
}

impl From<tokio_postgres::Error> for DbError {
    fn from(e: tokio_postgres::Error) -> Self {
        match e.as_db_error() {
            Some(db) => DbError::Query(db.message().to_string()),
            None => DbError::Query(e.to_string()),
        }
    }
}

/// Result type for item store operations.
pub type DbResult<T> = Result<T, DbError>;

/// Storage interface for the `items` table.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Drop and recreate the table, then insert [`SAMPLE_ITEMS`]. Destructive.
    async fn init_schema(&self) -> DbResult<()>;

    /// All rows in the store's natural order.
    async fn list_items(&self) -> DbResult<Vec<Item>>;

    /// Insert a row and return it with its assigned id.
    async fn add_item(&self, item: NewItem) -> DbResult<Item>;
}

/// PostgreSQL-backed item store.
pub struct PostgresItemStore {
    config: tokio_postgres::Config,
    connect_timeout: Duration,
    query_timeout: Duration,
}

impl PostgresItemStore {
    pub fn new(db: &DatabaseConfig) -> Self {
        let connect_timeout = Duration::from_secs(db.connect_timeout_secs);
        let mut config = tokio_postgres::Config::new();
        config
            .host(&db.host)
            .port(db.port)
            .dbname(&db.name)
            .user(&db.user)
            .connect_timeout(connect_timeout);
        if let Some(password) = &db.password {
            config.password(password.expose());
        }

        Self {
            config,
            connect_timeout,
            query_timeout: Duration::from_secs(db.query_timeout_secs),
        }
    }

    async fn connect(&self) -> DbResult<Client> {
        let (client, connection) = with_timeout("database connect", self.connect_timeout, async {
            self.config
                .connect(NoTls)
                .await
                .map_err(|e| DbError::Connect(e.to_string()))
        })
        .await?;

        // The connection task ends when `client` is dropped.
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::warn!(error = %e, "Database connection closed with error");
            }
        });

        Ok(client)
    }
}

#[async_trait]
impl ItemStore for PostgresItemStore {
    async fn init_schema(&self) -> DbResult<()> {
        let mut client = self.connect().await?;
        with_timeout("database init_schema", self.query_timeout, async {
            let tx = client.transaction().await?;
            tx.batch_execute(RESET_SCHEMA).await?;
            for (name, description) in SAMPLE_ITEMS {
                tx.execute(INSERT_ITEM, &[&name, &description]).await?;
            }
            tx.commit().await?;
            Ok::<_, DbError>(())
        })
        .await?;

        tracing::warn!("items table dropped and recreated");
        Ok(())
    }

    async fn list_items(&self) -> DbResult<Vec<Item>> {
        let client = self.connect().await?;
        with_timeout("database list_items", self.query_timeout, async {
            let rows = client.query(SELECT_ITEMS, &[]).await?;
            let mut items = Vec::with_capacity(rows.len());
            for row in rows {
                items.push(Item {
                    id: row.try_get(0)?,
                    name: row.try_get(1)?,
                    description: row.try_get(2)?,
                });
            }
            Ok::<_, DbError>(items)
        })
        .await
    }

    async fn add_item(&self, item: NewItem) -> DbResult<Item> {
        let client = self.connect().await?;
        let id: i32 = with_timeout("database add_item", self.query_timeout, async {
            let row = client
                .query_one(INSERT_ITEM, &[&item.name, &item.description])
                .await?;
            Ok::<_, DbError>(row.try_get(0)?)
        })
        .await?;

        Ok(Item {
            id,
            name: item.name,
            description: item.description,
        })
    }
}

#[derive(Debug, Default)]
struct Table {
    rows: Vec<Item>,
    next_id: i32,
}

/// Process-local item store used for development and tests.
///
/// Starts without a table, like a fresh database: reads and writes fail until
/// [`ItemStore::init_schema`] runs.
#[derive(Debug, Default)]
pub struct InMemoryItemStore {
    table: Mutex<Option<Table>>,
    offline: AtomicBool,
}

impl InMemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an unreachable database.
    pub fn set_available(&self, available: bool) {
        self.offline.store(!available, Ordering::SeqCst);
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Option<Table>>> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(DbError::Connect("in-memory database is offline".to_string()));
        }
        Ok(self.table.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

fn missing_table() -> DbError {
    DbError::Query("relation \"items\" does not exist".to_string())
}

#[async_trait]
impl ItemStore for InMemoryItemStore {
    async fn init_schema(&self) -> DbResult<()> {
        let mut guard = self.lock()?;
        let mut table = Table {
            rows: Vec::new(),
            next_id: 1,
        };
        for (name, description) in SAMPLE_ITEMS {
            table.rows.push(Item {
                id: table.next_id,
                name: name.to_string(),
                description: Some(description.to_string()),
            });
            table.next_id += 1;
        }
        *guard = Some(table);
        Ok(())
    }

    async fn list_items(&self) -> DbResult<Vec<Item>> {
        let guard = self.lock()?;
        let table = guard.as_ref().ok_or_else(missing_table)?;
        Ok(table.rows.clone())
    }

    async fn add_item(&self, item: NewItem) -> DbResult<Item> {
        let mut guard = self.lock()?;
        let table = guard.as_mut().ok_or_else(missing_table)?;
        let row = Item {
            id: table.next_id,
            name: item.name,
            description: item.description,
        };
        table.next_id += 1;
        table.rows.push(row.clone());
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_schema_seeds_two_items() {
        let store = InMemoryItemStore::new();
        store.init_schema().await.unwrap();

        let items = store.list_items().await.unwrap();
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["My First Item", "Another Item"]);
    }

    #[tokio::test]
    async fn test_init_schema_discards_existing_rows() {
        let store = InMemoryItemStore::new();
        store.init_schema().await.unwrap();
        store.add_item(NewItem::new("extra", None)).await.unwrap();

        store.init_schema().await.unwrap();
        assert_eq!(store.list_items().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_add_item_assigns_increasing_ids() {
        let store = InMemoryItemStore::new();
        store.init_schema().await.unwrap();

        let a = store.add_item(NewItem::new("X", None)).await.unwrap();
        let b = store.add_item(NewItem::new("Y", Some("why"))).await.unwrap();
        assert_eq!(a.id, 3);
        assert_eq!(b.id, 4);
        assert_eq!(b.description.as_deref(), Some("why"));

        let items = store.list_items().await.unwrap();
        assert!(items.contains(&a));
        assert!(items.contains(&b));
    }

    #[tokio::test]
    async fn test_fresh_store_has_no_table() {
        let store = InMemoryItemStore::new();
        assert!(matches!(store.list_items().await, Err(DbError::Query(_))));
        assert!(matches!(
            store.add_item(NewItem::new("X", None)).await,
            Err(DbError::Query(_))
        ));
    }

    #[tokio::test]
    async fn test_offline_store_reports_connect_error() {
        let store = InMemoryItemStore::new();
        store.set_available(false);
        assert!(matches!(store.init_schema().await, Err(DbError::Connect(_))));
        assert!(matches!(store.list_items().await, Err(DbError::Connect(_))));
    }

    #[test]
    fn test_password_only_set_when_present() {
        let mut db = DatabaseConfig::default();
        let store = PostgresItemStore::new(&db);
        assert!(store.config.get_password().is_none());
        assert_eq!(store.connect_timeout, Duration::from_secs(5));

        db.password = Some(crate::config::Secret::new("pw"));
        let store = PostgresItemStore::new(&db);
        assert_eq!(store.config.get_password(), Some(&b"pw"[..]));
        assert_eq!(store.config.get_dbname(), Some("itemsdb"));
    }

    #[tokio::test]
    async fn test_unreachable_database_is_a_connect_error() {
        let db = DatabaseConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            connect_timeout_secs: 1,
            ..DatabaseConfig::default()
        };
        let err = PostgresItemStore::new(&db).list_items().await.unwrap_err();
        assert!(
            matches!(err, DbError::Connect(_) | DbError::Timeout(_)),
            "unexpected error: {:?}",
            err
        );
    }
}
