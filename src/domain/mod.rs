mod auth;
mod clock;
mod error;
mod metrics;
mod models;
mod repository;
mod timestamp;

// Publicly expose the Metrics abstraction
pub use metrics::{Metrics, MetricsPtr};

// Time source used by every deadline rule
pub use clock::{system_clock, Clock, ClockPtr, FixedClock, SystemClock};

// Credential handling seams
pub use auth::{require_role, PasswordHasher, PasswordHasherPtr, TokenIssuer, TokenIssuerPtr};

// Error tiers
pub use error::{ServiceError, ServiceResult, StoreError, ValidationError};

// Entities
pub use models::{
    Exam, Identity, NewExam, NewRegistration, NewUser, Registration, RegistrationStatus, Role,
    User,
};

// Persistence abstractions
pub use repository::{
    ExamStore, ExamStorePtr, HealthProbe, HealthProbePtr, RegistrationStore,
    RegistrationStorePtr, StoreResult, Stores, UserStore, UserStorePtr,
};
