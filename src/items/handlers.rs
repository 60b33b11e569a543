use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::Html,
    Json,
};

use crate::http::response::{ApiError, MISSING_NAME_MESSAGE};
use crate::items::model::{Item, NewItem};
use crate::items::ItemsState;
use crate::observability::metrics;

pub const INIT_DB_DONE: &str = "Database initialized with 'items' table and sample data.";

pub async fn index() -> Html<&'static str> {
    Html("<h1>Items API is running!</h1><p>Use the /items endpoint to interact with the database.</p>")
}

pub async fn init_db(State(state): State<ItemsState>) -> Result<&'static str, ApiError> {
    if !state.allow_init_db {
        tracing::warn!("Refusing /init_db: disabled by items.allow_init_db");
        return Err(ApiError::Forbidden(
            "init_db is disabled on this instance".to_string(),
        ));
    }

    state.store.init_schema().await?;
    tracing::info!("Database initialized with sample data");
    Ok(INIT_DB_DONE)
}

pub async fn list_items(State(state): State<ItemsState>) -> Result<Json<Vec<Item>>, ApiError> {
    let items = state.store.list_items().await?;
    tracing::debug!(count = items.len(), "Listed items");
    Ok(Json(items))
}

/// The body is parsed by hand so that every malformed payload maps to the same 400.
pub async fn add_item(
    State(state): State<ItemsState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Item>), ApiError> {
    let new_item: NewItem = serde_json::from_slice(&body).map_err(|e| {
        tracing::debug!(error = %e, "Rejected item payload");
        ApiError::Validation(MISSING_NAME_MESSAGE.to_string())
    })?;

    let item = state.store.add_item(new_item).await?;
    metrics::record_item_created();
    tracing::info!(id = item.id, "Item created");
    Ok((StatusCode::CREATED, Json(item)))
}
