// Gateway module - controls public API for handlers
// Modules are private, only exported symbols are public

mod access;
mod auth;
mod exams;
mod health;
mod metrics;
mod registrations;
mod root;
mod shared_types;

// Core handlers
pub use health::health_check;
pub use metrics::{metrics_handler, track_http_metrics};
pub use root::root_handler;

// Error and response types shared with the session extractor
pub use shared_types::{ApiError, ErrorResponse, MessageResponse};

// Account handlers
pub use auth::{login, sign_up, LoginRequest, LoginResponse};

// Exam catalogue handlers
pub use exams::{
    all_exams, create_exam, delete_exam, exams_by_course, get_exam, update_exam, upcoming_exams,
};

// Registration handlers
pub use registrations::{
    cancel_registration, exam_registrations, my_registrations, register_for_exam,
};

// Access probes
pub use access::{admin_probe, public_probe, user_probe};
