use super::error::StoreError;
use super::models::{
    Exam, NewExam, NewRegistration, NewUser, Registration, RegistrationStatus, User,
};
use std::sync::Arc;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Persistence for user accounts.
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    // ---
    async fn find_user(&self, user_id: i64) -> StoreResult<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    async fn username_exists(&self, username: &str) -> StoreResult<bool>;

    async fn email_exists(&self, email: &str) -> StoreResult<bool>;

    /// Insert a new user. Duplicate username or email yields [`StoreError::Conflict`].
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;
}

/// Persistence for exams.
#[async_trait::async_trait]
pub trait ExamStore: Send + Sync {
    // ---
    async fn find_exam(&self, exam_id: i64) -> StoreResult<Option<Exam>>;

    async fn exam_exists(&self, exam_id: i64) -> StoreResult<bool>;

    async fn list_exams(&self) -> StoreResult<Vec<Exam>>;

    /// Active exams only, ascending by exam date.
    async fn list_active_exams_by_date(&self) -> StoreResult<Vec<Exam>>;

    /// Exact match on course name.
    async fn list_exams_by_course(&self, course_name: &str) -> StoreResult<Vec<Exam>>;

    async fn insert_exam(&self, exam: NewExam) -> StoreResult<Exam>;

    async fn update_exam(&self, exam: &Exam) -> StoreResult<Exam>;

    /// Returns false when nothing was deleted.
    async fn delete_exam(&self, exam_id: i64) -> StoreResult<bool>;
}

/// Persistence for registrations. Enforces uniqueness of (user, exam).
#[async_trait::async_trait]
pub trait RegistrationStore: Send + Sync {
    // ---
    async fn find_registration(&self, registration_id: i64) -> StoreResult<Option<Registration>>;

    async fn list_registrations_by_user(&self, user_id: i64) -> StoreResult<Vec<Registration>>;

    async fn list_registrations_by_exam(&self, exam_id: i64) -> StoreResult<Vec<Registration>>;

    async fn find_registration_for(
        &self,
        user_id: i64,
        exam_id: i64,
    ) -> StoreResult<Option<Registration>>;

    /// Insert a new row. A second row for the same (user, exam) yields
    /// [`StoreError::Conflict`].
    async fn insert_registration(&self, registration: NewRegistration)
        -> StoreResult<Registration>;

    /// Persist status, date and score of an existing row, provided its stored
    /// status is still `expected`. `None` when the row is gone or another
    /// writer changed its status first.
    async fn update_registration(
        &self,
        registration: &Registration,
        expected: RegistrationStatus,
    ) -> StoreResult<Option<Registration>>;
}

/// Connectivity probe used by the full health check.
#[async_trait::async_trait]
pub trait HealthProbe: Send + Sync {
    // ---
    async fn ping(&self) -> StoreResult<()>;
}

pub type UserStorePtr = Arc<dyn UserStore>;
pub type ExamStorePtr = Arc<dyn ExamStore>;
pub type RegistrationStorePtr = Arc<dyn RegistrationStore>;
pub type HealthProbePtr = Arc<dyn HealthProbe>;

/// The three stores plus the health probe, as handed to the services.
#[derive(Clone)]
pub struct Stores {
    // ---
    pub users: UserStorePtr,
    pub exams: ExamStorePtr,
    pub registrations: RegistrationStorePtr,
    pub health: HealthProbePtr,
}

impl Stores {
    // ---
    /// Splits one backend that implements every store trait into the
    /// individual trait objects.
    pub fn from_backend<R>(backend: Arc<R>) -> Self
    where
        R: UserStore + ExamStore + RegistrationStore + HealthProbe + 'static,
    {
        // ---
        Self {
            users: backend.clone(),
            exams: backend.clone(),
            registrations: backend.clone(),
            health: backend,
        }
    }
}
