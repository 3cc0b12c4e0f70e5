//! Account sign-up and credential checks.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::domain::{
    Identity, NewUser, PasswordHasher, PasswordHasherPtr, Role, ServiceError, ServiceResult,
    StoreError, TokenIssuer, TokenIssuerPtr, User, UserStore, UserStorePtr, ValidationError,
};

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

/// Sign-up payload. `role` defaults to STUDENT and is matched case-insensitively.
#[derive(Debug, Clone, Deserialize)]
pub struct SignUp {
    // ---
    pub username: String,
    pub password: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
}

impl SignUp {
    // ---
    fn validate(&self) -> Result<Role, ValidationError> {
        // ---
        if self.username.trim().is_empty() {
            return Err(ValidationError::InvalidInput(
                "Username must not be empty.".to_string(),
            ));
        }
        if self.password.is_empty() {
            return Err(ValidationError::InvalidInput(
                "Password must not be empty.".to_string(),
            ));
        }
        if !EMAIL_PATTERN.is_match(&self.email) {
            return Err(ValidationError::InvalidInput(
                "Email address is not valid.".to_string(),
            ));
        }

        match self.role.as_deref() {
            None => Ok(Role::Student),
            Some(text) if text.trim().is_empty() => Ok(Role::Student),
            Some(text) => text
                .parse()
                .map_err(|_| ValidationError::InvalidInput(format!("Unknown role: {text}"))),
        }
    }
}

#[derive(Clone)]
pub struct AuthService {
    // ---
    users: UserStorePtr,
    hasher: PasswordHasherPtr,
    tokens: TokenIssuerPtr,
}

impl AuthService {
    // ---
    pub fn new(users: UserStorePtr, hasher: PasswordHasherPtr, tokens: TokenIssuerPtr) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    /// Creates an account with a hashed password.
    pub async fn sign_up(&self, request: SignUp) -> ServiceResult<User> {
        // ---
        let role = request.validate()?;
        let username = request.username.trim().to_string();

        if self.users.username_exists(&username).await? {
            return Err(ValidationError::UsernameTaken.into());
        }
        if self.users.email_exists(&request.email).await? {
            return Err(ValidationError::EmailTaken.into());
        }

        let password_hash = self
            .hasher
            .hash(&request.password)
            .map_err(ServiceError::Internal)?;

        let user = self
            .users
            .insert_user(NewUser {
                username,
                password_hash,
                email: request.email,
                role,
            })
            .await
            .map_err(|err| match err {
                // A concurrent sign-up got there first.
                StoreError::Conflict(constraint) if constraint.contains("email") => {
                    ValidationError::EmailTaken.into()
                }
                StoreError::Conflict(_) => ValidationError::UsernameTaken.into(),
                other => ServiceError::from(other),
            })?;

        tracing::info!("Registered user {} ({}) as {}", user.id, user.username, user.role);
        Ok(user)
    }

    /// Checks a username/password pair. Unknown users and wrong passwords
    /// are indistinguishable to the caller.
    pub async fn authenticate(&self, username: &str, password: &str) -> ServiceResult<Identity> {
        // ---
        let Some(user) = self.users.find_user_by_username(username).await? else {
            tracing::warn!("Login attempt for unknown user {}", username);
            return Err(ValidationError::InvalidCredentials.into());
        };

        if !self.hasher.verify(password, &user.password_hash) {
            tracing::warn!("Wrong password for user {}", username);
            return Err(ValidationError::InvalidCredentials.into());
        }

        Ok(Identity::from(&user))
    }

    pub fn issue_token(&self, identity: &Identity) -> ServiceResult<String> {
        self.tokens.issue(identity).map_err(ServiceError::Internal)
    }

    /// Decodes a bearer token. `None` for anything expired, forged or malformed.
    pub fn verify_token(&self, token: &str) -> Option<Identity> {
        // ---
        match self.tokens.verify(token) {
            Ok(identity) => Some(identity),
            Err(err) => {
                tracing::debug!("Rejected bearer token: {err:#}");
                None
            }
        }
    }
}
