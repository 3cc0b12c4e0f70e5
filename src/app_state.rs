//! Application state management.
//!
//! `AppState` is the dependency container handed to every Axum handler via
//! the `State` extractor. It owns the three services plus the health probe
//! and the metrics backend. Everything inside is `Arc`-backed, so cloning per
//! request is cheap.

use crate::domain::{ClockPtr, HealthProbePtr, MetricsPtr, PasswordHasherPtr, Stores, TokenIssuerPtr};
use crate::services::{AuthService, ExamService, RegistrationService};

/// Shared application state passed to all Axum handlers.
///
/// Built once at startup and attached with `.with_state(state)`. Handlers
/// reach the business rules through the service accessors; nothing here is
/// mutated after construction.
#[derive(Clone)]
pub struct AppState {
    // ---
    auth: AuthService,
    exams: ExamService,
    registrations: RegistrationService,
    health: HealthProbePtr,
    metrics: MetricsPtr,
}

impl AppState {
    // ---

    /// Wires the services on top of one set of stores.
    pub fn new(
        stores: Stores,
        hasher: PasswordHasherPtr,
        tokens: TokenIssuerPtr,
        clock: ClockPtr,
        metrics: MetricsPtr,
    ) -> Self {
        // ---
        let Stores {
            users,
            exams,
            registrations,
            health,
        } = stores;

        AppState {
            auth: AuthService::new(users.clone(), hasher, tokens),
            exams: ExamService::new(exams.clone(), clock.clone()),
            registrations: RegistrationService::new(users, exams, registrations, clock),
            health,
            metrics,
        }
    }

    pub(crate) fn auth(&self) -> &AuthService {
        &self.auth
    }

    pub(crate) fn exams(&self) -> &ExamService {
        &self.exams
    }

    pub(crate) fn registrations(&self) -> &RegistrationService {
        &self.registrations
    }

    /// Store connectivity probe used by `/health?mode=full`.
    pub(crate) fn health(&self) -> &HealthProbePtr {
        &self.health
    }

    /// Get a reference to the metrics implementation.
    pub(crate) fn metrics(&self) -> &MetricsPtr {
        // ---
        &self.metrics
    }
}
