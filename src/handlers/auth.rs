//! Sign-up and login.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};

use super::shared_types::{ApiError, MessageResponse};
use crate::app_state::AppState;
use crate::domain::Role;
use crate::services::SignUp;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    // ---
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    // ---
    pub token: String,
    pub username: String,
    pub role: Role,
}

/// `POST /api/auth/register`
#[tracing::instrument(skip(state, payload))]
pub async fn sign_up(
    State(state): State<AppState>,
    payload: Result<Json<SignUp>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    // ---
    let Json(request) = payload?;
    state.auth().sign_up(request).await?;

    Ok(Json(MessageResponse::new("User registered successfully!")))
}

/// `POST /api/auth/login`
#[tracing::instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    // ---
    let Json(request) = payload?;

    let identity = state
        .auth()
        .authenticate(&request.username, &request.password)
        .await?;
    let token = state.auth().issue_token(&identity)?;

    tracing::info!("User {} logged in", identity.username);
    Ok(Json(LoginResponse {
        token,
        username: identity.username,
        role: identity.role,
    }))
}
