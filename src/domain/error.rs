use thiserror::Error;

/// Failure reported by a store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    // ---
    /// A uniqueness constraint rejected the write. Carries the constraint name.
    #[error("unique constraint violated: {0}")]
    Conflict(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// A business rule refused the operation. Each variant is reported to the
/// client as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    // ---
    #[error("User with ID {0} not found.")]
    UserNotFound(i64),

    #[error("Exam with ID {0} not found.")]
    ExamNotFound(i64),

    #[error("Registration with ID {0} not found.")]
    RegistrationNotFound(i64),

    #[error("Exam is not active for registration.")]
    ExamInactive,

    #[error("Registration deadline for this exam has passed.")]
    DeadlinePassed,

    #[error("Cannot register for an exam that has already occurred.")]
    ExamAlreadyOccurred,

    #[error("User is already registered for this exam.")]
    AlreadyRegistered,

    #[error("User is not authorized to cancel this registration.")]
    NotAuthorized,

    #[error("Registration is already cancelled.")]
    AlreadyCancelled,

    #[error("Cannot cancel registration less than 24 hours before the exam.")]
    CancellationWindowClosed,

    #[error("Exam date cannot be in the past.")]
    PastExamDate,

    #[error("Invalid username or password.")]
    InvalidCredentials,

    #[error("Username is already taken!")]
    UsernameTaken,

    #[error("Email is already in use!")]
    EmailTaken,

    #[error("{0}")]
    InvalidInput(String),
}

impl ValidationError {
    // ---
    /// True for the "referenced thing does not exist" family.
    pub fn is_not_found(&self) -> bool {
        // ---
        matches!(
            self,
            ValidationError::UserNotFound(_)
                | ValidationError::ExamNotFound(_)
                | ValidationError::RegistrationNotFound(_)
        )
    }
}

/// Error returned by every service operation.
#[derive(Debug, Error)]
pub enum ServiceError {
    // ---
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("store failure: {0}")]
    Store(#[from] StoreError),

    /// Hashing or token signing failed.
    #[error("internal failure: {0}")]
    Internal(#[source] anyhow::Error),
}

impl ServiceError {
    // ---
    pub fn validation(&self) -> Option<&ValidationError> {
        // ---
        match self {
            ServiceError::Validation(v) => Some(v),
            ServiceError::Store(_) | ServiceError::Internal(_) => None,
        }
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
