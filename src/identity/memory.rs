//! In-memory `IdentityProvider` test double: accepts any password on sign-in
//! provided the account was previously signed up or admin-created, so service
//! tests can exercise the auth flows without a real user pool.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::{Error, Result};

use super::{IdentityProvider, SignInOutcome, SignUpOutcome};

struct Account {
    subject: String,
    password: String,
    confirmed: bool,
}

#[derive(Default)]
pub struct MemoryIdentity {
    accounts: Mutex<HashMap<String, Account>>,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn sign_up(&self, email: &str, password: &str, _name: &str) -> Result<SignUpOutcome> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(email) {
            return Err(Error::Validation(crate::error::ValidationErrors::Single {
                field: "email".into(),
                message: "account already exists".into(),
            }));
        }
        let subject = Uuid::new_v4().to_string();
        accounts.insert(
            email.to_string(),
            Account {
                subject: subject.clone(),
                password: password.to_string(),
                confirmed: false,
            },
        );
        Ok(SignUpOutcome {
            subject,
            confirmed: false,
        })
    }

    async fn confirm_sign_up(&self, email: &str, _code: &str) -> Result<()> {
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts
            .get_mut(email)
            .ok_or_else(|| Error::NotFound(format!("account {email} not found")))?;
        account.confirmed = true;
        Ok(())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<SignInOutcome> {
        let accounts = self.accounts.lock().unwrap();
        let account = accounts
            .get(email)
            .ok_or_else(|| Error::AuthFailure("invalid credentials".into()))?;
        if account.password != password {
            return Err(Error::AuthFailure("invalid credentials".into()));
        }
        Ok(SignInOutcome {
            access_token: account.subject.clone(),
            id_token: account.subject.clone(),
            refresh_token: format!("refresh-{}", account.subject),
            expires_in: 3600,
            subject: account.subject.clone(),
        })
    }

    async fn admin_create_user(
        &self,
        email: &str,
        _name: &str,
        temporary_password: Option<String>,
    ) -> Result<(String, String)> {
        let mut accounts = self.accounts.lock().unwrap();
        let subject = Uuid::new_v4().to_string();
        let temporary_password = temporary_password.unwrap_or_else(|| format!("Tmp#{subject}A1"));
        accounts.insert(
            email.to_string(),
            Account {
                subject: subject.clone(),
                password: temporary_password.clone(),
                confirmed: true,
            },
        );
        Ok((subject, temporary_password))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sign_in_rejects_wrong_password() {
        let identity = MemoryIdentity::new();
        identity.sign_up("a@b.com", "correct-horse", "A").await.unwrap();
        let result = identity.sign_in("a@b.com", "wrong").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn admin_created_user_can_sign_in_with_temporary_password() {
        let identity = MemoryIdentity::new();
        let (_, temp_password) = identity.admin_create_user("b@c.com", "B", None).await.unwrap();
        let outcome = identity.sign_in("b@c.com", &temp_password).await.unwrap();
        assert!(!outcome.access_token.is_empty());
    }
}
