//! Bearer-token authentication for handlers.
//!
//! `Session` decodes the `Authorization: Bearer <token>` header once per
//! request. Handlers then call [`Session::require`] with the roles the route
//! admits.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

use crate::app_state::AppState;
use crate::domain::{require_role, Identity, Role};
use crate::handlers::ApiError;

// ---

/// Authenticated caller of the current request.
#[derive(Debug, Clone)]
pub struct Session(pub Identity);

// ---

impl Session {
    // ---
    /// Returns the identity when its role is one of `allowed`; 403 otherwise.
    pub fn require(&self, allowed: &[Role]) -> Result<&Identity, ApiError> {
        // ---
        if require_role(&self.0, allowed) {
            return Ok(&self.0);
        }

        tracing::debug!(
            "User {} with role {} denied; route requires {:?}",
            self.0.username,
            self.0.role,
            allowed
        );
        Err(ApiError::forbidden(
            "You do not have permission to access this resource.",
        ))
    }
}

impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // ---
        let token = bearer_token(&parts.headers)?;

        let identity = state
            .auth()
            .verify_token(token)
            .ok_or_else(|| ApiError::unauthorized("Invalid or expired token."))?;

        tracing::debug!("Authenticated {} as {}", identity.username, identity.role);
        Ok(Session(identity))
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
///
/// # Errors
///
/// Returns UNAUTHORIZED if the header is missing, not valid text, or not a
/// bearer credential.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    // ---
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized("Missing Authorization header."))?
        .to_str()
        .map_err(|_| ApiError::unauthorized("Invalid Authorization header."))?;

    let token = value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::unauthorized("Authorization header must use Bearer."))?;

    Ok(token)
}
