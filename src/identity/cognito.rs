//! Cognito-backed `IdentityProvider`, wired to the user pool named by
//! `USER_POOL_ID`/`USER_POOL_CLIENT_ID` (§6).

use async_trait::async_trait;
use aws_sdk_cognitoidentityprovider::types::AttributeType;
use aws_sdk_cognitoidentityprovider::Client;
use base64::Engine;
use rand::distr::{Alphanumeric, SampleString};

use crate::error::{Error, Result};

use super::{IdentityProvider, SignInOutcome, SignUpOutcome};

/// Pulls the `sub` claim out of a Cognito-issued id token without verifying
/// its signature: Cognito is reached over TLS and already trusted as the
/// identity provider, so this only needs to read the claim it signed, not
/// re-authenticate it.
fn subject_from_id_token(id_token: &str) -> Result<String> {
    let payload = id_token
        .split('.')
        .nth(1)
        .ok_or_else(|| Error::AuthFailure("malformed id token".into()))?;
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| Error::AuthFailure(format!("id token payload: {e}")))?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes)
        .map_err(|e| Error::AuthFailure(format!("id token claims: {e}")))?;
    claims
        .get("sub")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| Error::AuthFailure("id token missing sub claim".into()))
}

pub struct CognitoIdentity {
    client: Client,
    user_pool_id: String,
    client_id: String,
}

impl CognitoIdentity {
    pub fn new(client: Client, user_pool_id: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            client,
            user_pool_id: user_pool_id.into(),
            client_id: client_id.into(),
        }
    }
}

/// A temporary password meeting Cognito's default policy: 12+ chars, at
/// least one of each character class. The admin relays this to the user once.
fn generate_temporary_password() -> String {
    let body = Alphanumeric.sample_string(&mut rand::rng(), 12);
    format!("Tmp#{body}9a")
}

#[async_trait]
impl IdentityProvider for CognitoIdentity {
    async fn sign_up(&self, email: &str, password: &str, name: &str) -> Result<SignUpOutcome> {
        let output = self
            .client
            .sign_up()
            .client_id(&self.client_id)
            .username(email)
            .password(password)
            .user_attributes(
                AttributeType::builder()
                    .name("email")
                    .value(email)
                    .build()
                    .map_err(|e| Error::Internal(format!("attribute build: {e}")))?,
            )
            .user_attributes(
                AttributeType::builder()
                    .name("name")
                    .value(name)
                    .build()
                    .map_err(|e| Error::Internal(format!("attribute build: {e}")))?,
            )
            .send()
            .await
            .map_err(|e| Error::AuthFailure(format!("sign_up: {e}")))?;

        Ok(SignUpOutcome {
            subject: output.user_sub().to_string(),
            confirmed: output.user_confirmed(),
        })
    }

    async fn confirm_sign_up(&self, email: &str, code: &str) -> Result<()> {
        self.client
            .confirm_sign_up()
            .client_id(&self.client_id)
            .username(email)
            .confirmation_code(code)
            .send()
            .await
            .map_err(|e| Error::AuthFailure(format!("confirm_sign_up: {e}")))?;
        Ok(())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<SignInOutcome> {
        use aws_sdk_cognitoidentityprovider::types::AuthFlowType;

        let output = self
            .client
            .initiate_auth()
            .client_id(&self.client_id)
            .auth_flow(AuthFlowType::UserPasswordAuth)
            .auth_parameters("USERNAME", email)
            .auth_parameters("PASSWORD", password)
            .send()
            .await
            .map_err(|e| Error::AuthFailure(format!("initiate_auth: {e}")))?;

        let result = output
            .authentication_result()
            .ok_or_else(|| Error::AuthFailure("authentication challenge not supported".into()))?;

        let id_token = result.id_token().unwrap_or_default().to_string();
        let subject = subject_from_id_token(&id_token)?;

        Ok(SignInOutcome {
            access_token: result.access_token().unwrap_or_default().to_string(),
            id_token,
            refresh_token: result.refresh_token().unwrap_or_default().to_string(),
            expires_in: result.expires_in().max(0) as u64,
            subject,
        })
    }

    async fn admin_create_user(
        &self,
        email: &str,
        name: &str,
        temporary_password: Option<String>,
    ) -> Result<(String, String)> {
        let temporary_password = temporary_password.unwrap_or_else(generate_temporary_password);

        let output = self
            .client
            .admin_create_user()
            .user_pool_id(&self.user_pool_id)
            .username(email)
            .temporary_password(&temporary_password)
            .message_action(aws_sdk_cognitoidentityprovider::types::MessageActionType::Suppress)
            .user_attributes(
                AttributeType::builder()
                    .name("email")
                    .value(email)
                    .build()
                    .map_err(|e| Error::Internal(format!("attribute build: {e}")))?,
            )
            .user_attributes(
                AttributeType::builder()
                    .name("name")
                    .value(name)
                    .build()
                    .map_err(|e| Error::Internal(format!("attribute build: {e}")))?,
            )
            .user_attributes(
                AttributeType::builder()
                    .name("email_verified")
                    .value("true")
                    .build()
                    .map_err(|e| Error::Internal(format!("attribute build: {e}")))?,
            )
            .send()
            .await
            .map_err(|e| Error::AuthFailure(format!("admin_create_user: {e}")))?;

        let subject = output
            .user()
            .and_then(|u| u.username())
            .unwrap_or(email)
            .to_string();

        Ok((subject, temporary_password))
    }
}
