mod jwt;
mod password;

pub use jwt::{JwtClaims, JwtTokenIssuer};
pub use password::Argon2Hasher;

use crate::config::AuthConfig;
use crate::domain::{PasswordHasherPtr, TokenIssuerPtr};
use std::sync::Arc;

/// Creates the JWT issuer configured for this deployment.
pub fn create_token_issuer(config: &AuthConfig) -> TokenIssuerPtr {
    Arc::new(JwtTokenIssuer::from_config(config))
}

/// Creates the Argon2 password hasher.
pub fn create_password_hasher() -> PasswordHasherPtr {
    Arc::new(Argon2Hasher::new())
}
