//! JWT token generation and validation (HS256, shared secret).

use anyhow::{anyhow, Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::domain::{Identity, Role, TokenIssuer};

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID)
    pub sub: String,
    pub username: String,
    pub role: Role,
    /// Issued at timestamp (Unix epoch)
    pub iat: i64,
    /// Expiration timestamp (Unix epoch)
    pub exp: i64,
    /// Token ID
    pub jti: String,
}

impl JwtClaims {
    /// Create new claims for an identity
    pub fn new(identity: &Identity, expiration_hours: u64) -> Self {
        let now = Utc::now();
        let exp = now + Duration::hours(expiration_hours as i64);

        Self {
            sub: identity.user_id.to_string(),
            username: identity.username.clone(),
            role: identity.role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    pub fn into_identity(self) -> Result<Identity> {
        let user_id = self
            .sub
            .parse()
            .map_err(|_| anyhow!("token subject is not a user id: {}", self.sub))?;

        Ok(Identity {
            user_id,
            username: self.username,
            role: self.role,
        })
    }
}

/// Token issuer backed by a shared HMAC secret.
#[derive(Clone)]
pub struct JwtTokenIssuer {
    expiration_hours: u64,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl Debug for JwtTokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtTokenIssuer")
            .field("expiration_hours", &self.expiration_hours)
            .field("encoding_key", &"[hidden]")
            .field("decoding_key", &"[hidden]")
            .finish()
    }
}

impl JwtTokenIssuer {
    pub fn new(secret: &str, expiration_hours: u64) -> Self {
        Self {
            expiration_hours,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.jwt_secret, config.jwt_expiration_hours)
    }

    pub fn expiration_hours(&self) -> u64 {
        self.expiration_hours
    }
}

impl TokenIssuer for JwtTokenIssuer {
    fn issue(&self, identity: &Identity) -> Result<String> {
        let claims = JwtClaims::new(identity, self.expiration_hours);

        encode(&Header::default(), &claims, &self.encoding_key).context("Failed to generate JWT")
    }

    fn verify(&self, token: &str) -> Result<Identity> {
        let token_data = decode::<JwtClaims>(token, &self.decoding_key, &Validation::default())
            .context("Invalid JWT")?;

        token_data.claims.into_identity()
    }
}
