//! PostgreSQL-backed stores.
//!
//! Connection setup retries for a bounded number of attempts so the service
//! can start alongside a database container that is still booting. The
//! embedded migration runs once the pool is up.

mod postgres_repository;

pub use postgres_repository::PostgresRepository;

use crate::config::DatabaseConfig;
use crate::domain::Stores;
use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Connects to PostgreSQL and applies pending migrations.
///
/// # Errors
/// Returns an error once `retry_count` attempts have failed, or if the
/// migration itself fails.
pub async fn connect_with_retry(config: &DatabaseConfig) -> Result<PgPool> {
    // ---
    let options = PgPoolOptions::new()
        .min_connections(config.min_connections)
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout);

    let attempts = config.retry_count.max(1);
    let mut attempt = 0;

    let pool = loop {
        attempt += 1;
        match options.clone().connect(&config.database_url).await {
            Ok(pool) => break pool,
            Err(err) if attempt < attempts => {
                tracing::warn!(
                    "Database connection attempt {}/{} failed: {}",
                    attempt,
                    attempts,
                    err
                );
                tokio::time::sleep(RETRY_DELAY).await;
            }
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("Could not connect to database after {attempts} attempts")
                });
            }
        }
    };

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!("Database ready after {} attempt(s)", attempt);
    Ok(pool)
}

/// Wraps a pool as the full set of stores.
pub fn create_postgres_repository(pool: PgPool) -> Stores {
    // ---
    Stores::from_backend(Arc::new(PostgresRepository::new(pool)))
}
