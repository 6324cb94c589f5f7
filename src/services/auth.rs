//! Auth service (§4.7): signup/confirm/signin against the identity provider,
//! plus the profile read/update that stores the domain-level `User` record
//! in the wide table once an identity exists.

use chrono::Utc;

use crate::error::{Error, Result};
use crate::models::users::{Role, Scope, User};
use crate::state::AppState;
use crate::store::{ItemKey, PutItem};

fn user_key(user_id: &str) -> ItemKey {
    ItemKey::new(format!("USER#{user_id}"), "META".to_string())
}

pub struct SignUpOutput {
    pub user_id: String,
    pub confirmed: bool,
}

pub async fn sign_up(state: &AppState, email: &str, password: &str, name: &str) -> Result<SignUpOutput> {
    let outcome = state.identity.sign_up(email, password, name).await?;

    let now = Utc::now();
    let user = User {
        user_id: outcome.subject.clone(),
        email: email.to_string(),
        name: name.to_string(),
        role: Role::User,
        scope: Scope::default(),
        created_at: now,
        updated_at: now,
    };
    put_user(state, &user).await?;

    Ok(SignUpOutput {
        user_id: outcome.subject,
        confirmed: outcome.confirmed,
    })
}

pub async fn confirm_sign_up(state: &AppState, email: &str, code: &str) -> Result<()> {
    state.identity.confirm_sign_up(email, code).await
}

pub struct SignInOutput {
    pub access_token: String,
    pub id_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    pub user: User,
}

pub async fn sign_in(state: &AppState, email: &str, password: &str) -> Result<SignInOutput> {
    let outcome = state.identity.sign_in(email, password).await?;
    let user = get_user(state, &outcome.subject)
        .await?
        .ok_or_else(|| Error::NotFound(format!("user record for {}", outcome.subject)))?;

    Ok(SignInOutput {
        access_token: outcome.access_token,
        id_token: outcome.id_token,
        refresh_token: outcome.refresh_token,
        expires_in: outcome.expires_in,
        user,
    })
}

pub async fn get_user(state: &AppState, user_id: &str) -> Result<Option<User>> {
    match state.store.get_item(&user_key(user_id)).await? {
        Some(value) => Ok(Some(crate::store::decode(value)?)),
        None => Ok(None),
    }
}

async fn put_user(state: &AppState, user: &User) -> Result<()> {
    state
        .store
        .put_item(
            user_key(&user.user_id),
            crate::store::encode(user)?,
            PutItem {
                gsi1_pk: Some("USERS".to_string()),
                gsi1_sk: Some(format!("USER#{}", user.created_at.to_rfc3339())),
                ..Default::default()
            },
        )
        .await
}

pub async fn update_profile(state: &AppState, user_id: &str, name: Option<String>) -> Result<User> {
    let mut user = get_user(state, user_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("user {user_id}")))?;

    if let Some(name) = name {
        user.name = name;
    }
    user.updated_at = Utc::now();
    put_user(state, &user).await?;
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::identity::memory::MemoryIdentity;
    use crate::providers::testing::StubProvider;
    use std::sync::Arc;

    fn test_state() -> AppState {
        AppState::new(
            Arc::new(crate::store::memory::MemoryKvStore::new()),
            Arc::new(crate::store::memory::MemoryBlobStore::new()),
            Arc::new(MemoryIdentity::new()),
            Arc::new(StubProvider::default()),
            Arc::new(StubProvider::default()),
            Arc::new(Config::default()),
        )
    }

    #[tokio::test]
    async fn sign_up_creates_a_user_record_with_default_role() {
        let state = test_state();
        let output = sign_up(&state, "a@b.com", "password123", "Alice").await.unwrap();
        let user = get_user(&state, &output.user_id).await.unwrap().unwrap();
        assert_eq!(user.role, Role::User);
        assert_eq!(user.email, "a@b.com");
    }

    #[tokio::test]
    async fn sign_in_fails_for_unknown_account() {
        let state = test_state();
        let result = sign_in(&state, "nobody@b.com", "x").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn update_profile_changes_name_and_bumps_updated_at() {
        let state = test_state();
        let output = sign_up(&state, "a@b.com", "password123", "Alice").await.unwrap();
        let before = get_user(&state, &output.user_id).await.unwrap().unwrap();

        let updated = update_profile(&state, &output.user_id, Some("Alicia".into()))
            .await
            .unwrap();
        assert_eq!(updated.name, "Alicia");
        assert!(updated.updated_at >= before.updated_at);
    }
}
