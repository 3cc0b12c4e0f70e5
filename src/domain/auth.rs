use super::models::Identity;
use std::fmt::Debug;
use std::sync::Arc;

/// Hashes and verifies account passwords.
pub trait PasswordHasher: Send + Sync + Debug {
    // ---
    fn hash(&self, password: &str) -> anyhow::Result<String>;

    /// False for a mismatch and for an unparsable hash alike.
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// Issues and verifies the bearer credential handed out at login.
pub trait TokenIssuer: Send + Sync + Debug {
    // ---
    fn issue(&self, identity: &Identity) -> anyhow::Result<String>;

    /// Decodes a token back into the identity it was issued for.
    /// Fails on bad signature, malformed claims, or expiry.
    fn verify(&self, token: &str) -> anyhow::Result<Identity>;
}

pub type PasswordHasherPtr = Arc<dyn PasswordHasher>;
pub type TokenIssuerPtr = Arc<dyn TokenIssuer>;

/// Returns true when the identity holds one of the allowed roles.
pub fn require_role(identity: &Identity, allowed: &[super::Role]) -> bool {
    allowed.contains(&identity.role)
}
