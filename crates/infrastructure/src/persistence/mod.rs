//! PostgreSQL persistence

pub mod outbox;
pub mod processed_events;

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use tavolo_shared::config::DatabaseConfig;

/// Open a connection pool against the configured database.
pub async fn connect_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.pool_size)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .connect(&config.url)
        .await
}
