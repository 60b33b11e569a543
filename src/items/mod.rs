//! Items CRUD service.
//!
//! ```text
//! GET  /          → HTML status page
//! GET  /init_db   → drop, recreate and seed the table (guarded)
//! GET  /items     → every row as JSON
//! POST /items     → insert {name, description?}, 201 with the stored row
//! ```

pub mod handlers;
pub mod model;
pub mod store;

use std::sync::Arc;

use axum::{routing::get, Router};

use self::handlers::*;
pub use self::model::{Item, NewItem, SAMPLE_ITEMS};
pub use self::store::{DbError, InMemoryItemStore, ItemStore, PostgresItemStore};

/// State injected into item handlers.
#[derive(Clone)]
pub struct ItemsState {
    pub store: Arc<dyn ItemStore>,
    pub allow_init_db: bool,
}

pub fn setup_items_router(state: ItemsState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/init_db", get(init_db))
        .route("/items", get(list_items).post(add_item))
        .with_state(state)
}
