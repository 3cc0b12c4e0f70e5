//! Business rules, independent of HTTP and of the storage backend.

mod auth;
mod exam;
mod registration;

pub use auth::{AuthService, SignUp};
pub use exam::ExamService;
pub use registration::{
    can_cancel, check_admission, check_cancellation_window, RegistrationService,
    CANCELLATION_NOTICE_HOURS,
};
