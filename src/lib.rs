// src/lib.rs
use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue},
    middleware,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, CorsLayer},
    trace::TraceLayer,
};

use handlers::*;

// Public exports (visible outside this module)
pub mod domain;

// Internal-only exports (sibling access within this module)
mod app_state;
mod config;
mod handlers;
mod infrastructure;
mod services;
mod session;

// Hoist up only the public symbol(s)
pub use app_state::AppState;
pub use handlers::{ApiError, ErrorResponse, LoginResponse, MessageResponse};
pub use services::{AuthService, ExamService, RegistrationService, SignUp};
pub use session::Session;

pub use config::*;

// Publicly expose the infrastructure creation functions
pub use infrastructure::{
    connect_with_retry, // ---
    create_memory_repository,
    create_noop_metrics,
    create_password_hasher,
    create_postgres_repository,
    create_prom_metrics,
    create_token_issuer,
    MemoryRepository,
    PostgresRepository,
};

/// Builds the application state described by `config`.
///
/// Connects to PostgreSQL (with retry and migration) unless the in-memory
/// store is selected.
pub async fn create_state(config: &AppConfig) -> Result<AppState> {
    // ---
    let metrics = if config.metrics_type == "prom" {
        create_prom_metrics()?
    } else {
        create_noop_metrics()?
    };

    let stores = match config.store {
        StoreKind::Postgres => {
            let database = config
                .database
                .as_ref()
                .context("PostgreSQL store selected without database configuration")?;
            create_postgres_repository(connect_with_retry(database).await?)
        }
        StoreKind::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on shutdown");
            create_memory_repository()
        }
    };

    Ok(AppState::new(
        stores,
        create_password_hasher(),
        create_token_issuer(&config.auth),
        domain::system_clock(),
        metrics,
    ))
}

/// Builds the HTTP router over an already wired state.
pub fn build_router(app_state: AppState, http: &HttpConfig) -> Result<Router> {
    // ---
    let origin: HeaderValue = http
        .cors_origin
        .parse()
        .with_context(|| format!("Invalid CORS origin: {}", http.cors_origin))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .expose_headers([header::AUTHORIZATION])
        .max_age(Duration::from_secs(3600));

    let router = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/api/auth/register", post(sign_up))
        .route("/api/auth/login", post(login))
        .route("/api/exams", get(upcoming_exams).post(create_exam))
        .route("/api/exams/all", get(all_exams))
        .route("/api/exams/course/{course_name}", get(exams_by_course))
        .route(
            "/api/exams/{id}",
            get(get_exam).put(update_exam).delete(delete_exam),
        )
        .route("/api/registrations/my", get(my_registrations))
        .route("/api/registrations/exam/{exam_id}", get(exam_registrations))
        .route(
            "/api/registrations/{id}",
            post(register_for_exam).delete(cancel_registration),
        )
        .route("/api/test/public", get(public_probe))
        .route("/api/test/user", get(user_probe))
        .route("/api/test/admin", get(admin_probe))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            track_http_metrics,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state);

    Ok(router)
}

/// Build the full application from configuration.
pub async fn create_app(config: &AppConfig) -> Result<Router> {
    // ---
    let app_state = create_state(config).await?;
    build_router(app_state, &config.http)
}
