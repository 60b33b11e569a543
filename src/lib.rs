//! Gated demo APIs: a weather/customer service with per-key call accounting
//! and an items CRUD service over PostgreSQL.

pub mod accounting;
pub mod config;
pub mod http;
pub mod items;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod security;
pub mod store;
pub mod weather;

pub use config::schema::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
