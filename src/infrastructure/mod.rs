pub mod auth;
mod database;
mod memory;
pub mod metrics;

// Re-export the factory functions for easy access
pub use auth::{create_password_hasher, create_token_issuer};
pub use database::{connect_with_retry, create_postgres_repository, PostgresRepository};
pub use memory::{create_memory_repository, MemoryRepository};
pub use metrics::{create_noop_metrics, create_prom_metrics};
