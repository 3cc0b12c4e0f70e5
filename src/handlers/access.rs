//! Access probes for checking tokens and roles from a client.

use crate::domain::Role;
use crate::session::Session;

use super::shared_types::ApiError;

pub async fn public_probe() -> &'static str {
    "This is a public endpoint. Anyone can access it."
}

pub async fn user_probe(session: Session) -> Result<&'static str, ApiError> {
    // ---
    session.require(&[Role::Student, Role::Admin])?;
    Ok("This is a user-only endpoint. You are authenticated!")
}

pub async fn admin_probe(session: Session) -> Result<&'static str, ApiError> {
    // ---
    session.require(&[Role::Admin])?;
    Ok("This is an admin-only endpoint. You are authenticated as an admin!")
}
