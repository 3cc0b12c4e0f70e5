//! Exam catalogue endpoints.
//!
//! Writes are admin-only. Reads are open to any authenticated role except
//! the unfiltered listing, which also shows inactive and past exams.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::Response,
    Json,
};

use super::shared_types::{list_or_no_content, ApiError};
use crate::app_state::AppState;
use crate::domain::{Exam, Metrics, NewExam, Role};
use crate::session::Session;

const ANY_ROLE: &[Role] = &[Role::Admin, Role::Student];

/// `POST /api/exams`
#[tracing::instrument(skip(state, session, payload))]
pub async fn create_exam(
    State(state): State<AppState>,
    session: Session,
    payload: Result<Json<NewExam>, JsonRejection>,
) -> Result<(StatusCode, Json<Exam>), ApiError> {
    // ---
    let admin = session.require(&[Role::Admin])?;
    let Json(draft) = payload?;

    let exam = state.exams().create(draft, admin).await?;
    state.metrics().record_exam_created();

    Ok((StatusCode::CREATED, Json(exam)))
}

/// `GET /api/exams/{id}`
#[tracing::instrument(skip(state, session))]
pub async fn get_exam(
    State(state): State<AppState>,
    session: Session,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Exam>, ApiError> {
    // ---
    session.require(ANY_ROLE)?;
    let Path(id) = id?;

    state
        .exams()
        .exam(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Exam with ID {id} not found.")))
}

/// `GET /api/exams/all`
#[tracing::instrument(skip(state, session))]
pub async fn all_exams(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<Exam>>, ApiError> {
    // ---
    session.require(&[Role::Admin])?;
    Ok(Json(state.exams().all_exams().await?))
}

/// `GET /api/exams`: active exams that have not started yet.
#[tracing::instrument(skip(state, session))]
pub async fn upcoming_exams(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<Exam>>, ApiError> {
    // ---
    session.require(ANY_ROLE)?;
    Ok(Json(state.exams().upcoming_exams().await?))
}

/// `GET /api/exams/course/{course_name}`
#[tracing::instrument(skip(state, session))]
pub async fn exams_by_course(
    State(state): State<AppState>,
    session: Session,
    course_name: Result<Path<String>, PathRejection>,
) -> Result<Response, ApiError> {
    // ---
    session.require(ANY_ROLE)?;
    let Path(course_name) = course_name?;

    let exams = state.exams().exams_by_course(&course_name).await?;
    Ok(list_or_no_content(exams))
}

/// `PUT /api/exams/{id}`
#[tracing::instrument(skip(state, session, payload))]
pub async fn update_exam(
    State(state): State<AppState>,
    session: Session,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<NewExam>, JsonRejection>,
) -> Result<Json<Exam>, ApiError> {
    // ---
    session.require(&[Role::Admin])?;
    let Path(id) = id?;
    let Json(update) = payload?;

    Ok(Json(state.exams().update(id, update).await?))
}

/// `DELETE /api/exams/{id}`
#[tracing::instrument(skip(state, session))]
pub async fn delete_exam(
    State(state): State<AppState>,
    session: Session,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    // ---
    session.require(&[Role::Admin])?;
    let Path(id) = id?;

    state
        .exams()
        .delete(id)
        .await
        .map_err(ApiError::with_not_found)?;

    Ok(StatusCode::NO_CONTENT)
}
