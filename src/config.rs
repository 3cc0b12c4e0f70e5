// src/config.rs

//! Application configuration loaded from environment variables.
//!
//! This module defines all startup-time configuration for the service.
//! Configuration is validated eagerly and failures are treated as
//! deployment errors rather than recoverable runtime conditions.

use anyhow::Result;
use std::time::Duration;

// ============================================================
// Local macros (config-only, intentionally explicit)
// ============================================================

/// Reads a required environment variable.
///
/// # Behavior
/// - Fails fast if the variable is missing
/// - Produces a clear, human-readable error message
/// - Intended for startup-time configuration validation
macro_rules! required_env {
    // ---
    ($key:literal) => {
        std::env::var($key)
            .map_err(|_| anyhow::anyhow!(concat!("Missing required configuration: ", $key)))?
    };
}

/// Reads an optional environment variable and attempts to parse it.
///
/// If the variable is missing or cannot be parsed, the provided
/// default value is used.
macro_rules! optional_env_parse {
    // ---
    ($key:literal, $ty:ty, $default:expr) => {
        std::env::var($key)
            .ok()
            .and_then(|v| v.parse::<$ty>().ok())
            .unwrap_or($default)
    };
}

/// Reads an optional string environment variable with a default.
macro_rules! optional_env {
    // ---
    ($key:literal, $default:expr) => {
        std::env::var($key).unwrap_or_else(|_| $default.to_string())
    };
}

#[cfg(test)]
/// Asserts that a configuration constructor fails due to a missing
/// required environment variable.
macro_rules! assert_missing_config {
    // ---
    ($expr:expr, $key:literal) => {{
        let err = $expr.expect_err("expected configuration error");
        assert!(
            err.to_string()
                .contains(concat!("Missing required configuration: ", $key)),
            "unexpected error: {err}"
        );
    }};
}

// ============================================================
// Public configuration facade
// ============================================================

/// Which store backend to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Postgres,
    Memory,
}

/// Aggregated application configuration.
///
/// This is the single source of truth for startup configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store: StoreKind,
    /// Present only when `store` is [`StoreKind::Postgres`].
    pub database: Option<database::DatabaseConfig>,
    pub auth: auth::AuthConfig,
    pub http: http::HttpConfig,
    pub metrics_type: String,
}

impl AppConfig {
    /// Loads and validates all application configuration from the environment.
    ///
    /// # Errors
    /// Returns an error if any required configuration is missing or invalid.
    pub fn from_env() -> Result<Self> {
        // ---
        let store = match optional_env!("EXAMREG_STORE_TYPE", "postgres").as_str() {
            "memory" => StoreKind::Memory,
            "postgres" => StoreKind::Postgres,
            other => anyhow::bail!("Unsupported EXAMREG_STORE_TYPE: {other}"),
        };

        let database = match store {
            StoreKind::Postgres => Some(database::DatabaseConfig::from_env()?),
            StoreKind::Memory => None,
        };

        Ok(Self {
            store,
            database,
            auth: auth::AuthConfig::from_env()?,
            http: http::HttpConfig::from_env(),
            metrics_type: optional_env!("EXAMREG_METRICS_TYPE", "noop"),
        })
    }
}

// ============================================================
// Database configuration
// ============================================================

mod database {
    // ---
    use super::*;

    /// Database-related configuration derived from environment variables.
    #[derive(Debug, Clone)]
    pub struct DatabaseConfig {
        /// PostgreSQL connection string.
        pub database_url: String,

        /// Number of attempts when initializing the database connection. Defaults to 50.
        pub retry_count: u32,

        /// Maximum time to wait when acquiring a connection from the pool. Defaults to 30 seconds.
        pub acquire_timeout: Duration,

        /// Minimum number of connections to keep in the pool, even when idle. Defaults to 2.
        pub min_connections: u32,

        /// Maximum number of connections open concurrently. Defaults to 15.
        pub max_connections: u32,
    }

    impl DatabaseConfig {
        /// Builds a [`DatabaseConfig`] from environment variables.
        ///
        /// # Errors
        /// Returns an error if `DATABASE_URL` is missing.
        pub fn from_env() -> Result<Self> {
            // ---
            let database_url = required_env!("DATABASE_URL");
            let retry_count = optional_env_parse!("EXAMREG_DB_RETRY_COUNT", u32, 50);
            let acquire_timeout_secs =
                optional_env_parse!("EXAMREG_DB_ACQUIRE_TIMEOUT_SEC", u64, 30);
            let min_connections = optional_env_parse!("EXAMREG_DB_MIN_CONNECTIONS", u32, 2);
            let max_connections = optional_env_parse!("EXAMREG_DB_MAX_CONNECTIONS", u32, 15);

            Ok(Self {
                database_url,
                retry_count,
                acquire_timeout: Duration::from_secs(acquire_timeout_secs),
                min_connections,
                max_connections,
            })
        }
    }
}
pub use database::DatabaseConfig;

// ============================================================
// Token configuration
// ============================================================

mod auth {
    // ---
    use super::*;

    /// Longest accepted token lifetime: one year.
    pub const MAX_JWT_EXPIRATION_HOURS: u64 = 24 * 366;

    /// Bearer token signing configuration.
    #[derive(Clone)]
    pub struct AuthConfig {
        /// HMAC secret used to sign and verify tokens.
        pub jwt_secret: String,

        /// Lifetime of an issued token. Defaults to 10 hours.
        pub jwt_expiration_hours: u64,
    }

    // Keep the secret out of startup logs.
    impl std::fmt::Debug for AuthConfig {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("AuthConfig")
                .field("jwt_secret", &"[hidden]")
                .field("jwt_expiration_hours", &self.jwt_expiration_hours)
                .finish()
        }
    }

    impl AuthConfig {
        /// Builds an [`AuthConfig`] from environment variables.
        ///
        /// # Errors
        /// Returns an error if the signing secret is missing or empty, or if
        /// the token lifetime is zero or longer than
        /// [`MAX_JWT_EXPIRATION_HOURS`].
        pub fn from_env() -> Result<Self> {
            // ---
            let jwt_secret = required_env!("EXAMREG_JWT_SECRET");
            if jwt_secret.trim().is_empty() {
                anyhow::bail!("EXAMREG_JWT_SECRET must not be empty");
            }
            let jwt_expiration_hours = optional_env_parse!("EXAMREG_JWT_EXPIRATION_HOURS", u64, 10);
            if !(1..=MAX_JWT_EXPIRATION_HOURS).contains(&jwt_expiration_hours) {
                anyhow::bail!(
                    "EXAMREG_JWT_EXPIRATION_HOURS must be between 1 and {MAX_JWT_EXPIRATION_HOURS}, got {jwt_expiration_hours}"
                );
            }

            Ok(Self {
                jwt_secret,
                jwt_expiration_hours,
            })
        }
    }
}
pub use auth::AuthConfig;

// ============================================================
// HTTP configuration
// ============================================================

mod http {
    // ---

    /// Listener and browser-facing settings.
    #[derive(Debug, Clone)]
    pub struct HttpConfig {
        /// Socket address to bind. Defaults to `127.0.0.1:8080`.
        pub bind_addr: String,

        /// The single origin allowed to make cross-origin requests.
        pub cors_origin: String,
    }

    impl HttpConfig {
        pub fn from_env() -> Self {
            // ---
            Self {
                bind_addr: optional_env!("EXAMREG_BIND_ADDR", "127.0.0.1:8080"),
                cors_origin: optional_env!("EXAMREG_CORS_ORIGIN", "http://localhost:5173"),
            }
        }
    }
}
pub use http::HttpConfig;

// ============================================================
// Tests
// ============================================================
