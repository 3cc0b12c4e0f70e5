use axum::response::IntoResponse;

pub async fn root_handler() -> impl IntoResponse {
    let version = env!("CARGO_PKG_VERSION");
    format!(
        r#"Welcome to the Exam Registration API 👋
Version: {version}

Available endpoints:
  - POST   /api/auth/register                 - Create an account
  - POST   /api/auth/login                    - Obtain a bearer token
  - GET    /api/exams                         - Upcoming active exams
  - GET    /api/exams/all                     - Every exam (admin)
  - GET    /api/exams/{{id}}                    - Fetch an exam by id
  - GET    /api/exams/course/{{courseName}}     - Exams of one course
  - POST   /api/exams                         - Create an exam (admin)
  - PUT    /api/exams/{{id}}                    - Update an exam (admin)
  - DELETE /api/exams/{{id}}                    - Delete an exam (admin)
  - POST   /api/registrations/{{examId}}        - Register for an exam (student)
  - GET    /api/registrations/my              - Own registrations (student)
  - GET    /api/registrations/exam/{{examId}}   - Registrations of an exam (admin)
  - DELETE /api/registrations/{{id}}            - Cancel a registration
  - GET    /health                            - Light health check
  - GET    /health?mode=full                  - Full health check (includes the store)
  - GET    /metrics                           - Prometheus metrics
"#
    )
}
