//! Identity provider abstraction (§4.7): wraps account lifecycle operations
//! the auth/admin services call, so the Cognito-shaped implementation can be
//! swapped for an in-memory double in tests without the services knowing.

pub mod cognito;
pub mod memory;

use async_trait::async_trait;

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    pub subject: String,
    pub confirmed: bool,
}

#[derive(Debug, Clone)]
pub struct SignInOutcome {
    pub access_token: String,
    pub id_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    pub subject: String,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str, name: &str) -> Result<SignUpOutcome>;

    async fn confirm_sign_up(&self, email: &str, code: &str) -> Result<()>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<SignInOutcome>;

    /// Provisions an account out-of-band of self-service signup, e.g. when an
    /// org/company admin creates a user for someone else (§4.7). Uses
    /// `temporary_password` if the caller supplied one, otherwise generates
    /// an opaque one. Returns the subject id and the password that was used,
    /// so the caller can relay it to the new user exactly once.
    async fn admin_create_user(
        &self,
        email: &str,
        name: &str,
        temporary_password: Option<String>,
    ) -> Result<(String, String)>;
}
