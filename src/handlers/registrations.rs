//! Registration endpoints.

use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::StatusCode,
    response::Response,
    Json,
};

use super::shared_types::{list_or_no_content, ApiError};
use crate::app_state::AppState;
use crate::domain::{Metrics, Registration, Role};
use crate::session::Session;

/// `POST /api/registrations/{exam_id}`: the calling student registers.
#[tracing::instrument(skip(state, session))]
pub async fn register_for_exam(
    State(state): State<AppState>,
    session: Session,
    exam_id: Result<Path<i64>, PathRejection>,
) -> Result<(StatusCode, Json<Registration>), ApiError> {
    // ---
    let student = session.require(&[Role::Student])?;
    let Path(exam_id) = exam_id?;

    let registration = state
        .registrations()
        .register(student.user_id, exam_id)
        .await
        .inspect_err(|err| {
            if let Some(rule) = err.validation() {
                tracing::warn!(
                    "Registration of user {} for exam {} refused: {}",
                    student.user_id,
                    exam_id,
                    rule
                );
            }
        })?;
    state.metrics().record_registration_created();

    Ok((StatusCode::CREATED, Json(registration)))
}

/// `GET /api/registrations/my`
#[tracing::instrument(skip(state, session))]
pub async fn my_registrations(
    State(state): State<AppState>,
    session: Session,
) -> Result<Response, ApiError> {
    // ---
    let student = session.require(&[Role::Student])?;

    let registrations = state
        .registrations()
        .registrations_for_user(student.user_id)
        .await?;
    Ok(list_or_no_content(registrations))
}

/// `GET /api/registrations/exam/{exam_id}`
#[tracing::instrument(skip(state, session))]
pub async fn exam_registrations(
    State(state): State<AppState>,
    session: Session,
    exam_id: Result<Path<i64>, PathRejection>,
) -> Result<Response, ApiError> {
    // ---
    session.require(&[Role::Admin])?;
    let Path(exam_id) = exam_id?;

    let registrations = state
        .registrations()
        .registrations_for_exam(exam_id)
        .await
        .map_err(ApiError::with_not_found)?;
    Ok(list_or_no_content(registrations))
}

/// `DELETE /api/registrations/{registration_id}`: cancels, keeping the row.
#[tracing::instrument(skip(state, session))]
pub async fn cancel_registration(
    State(state): State<AppState>,
    session: Session,
    registration_id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    // ---
    let requester = session.require(&[Role::Student, Role::Admin])?;
    let Path(registration_id) = registration_id?;

    state
        .registrations()
        .cancel(registration_id, requester)
        .await
        .inspect_err(|err| {
            if let Some(rule) = err.validation() {
                tracing::warn!(
                    "Cancellation of registration {} by user {} refused: {}",
                    registration_id,
                    requester.user_id,
                    rule
                );
            }
        })?;
    state.metrics().record_registration_cancelled();

    Ok(StatusCode::NO_CONTENT)
}
