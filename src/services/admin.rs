//! Admin service (§4.7): scope-filtered user listing and admin-driven user
//! creation, both gated by `access::can_create_user`/the role hierarchy.

use chrono::Utc;

use crate::access;
use crate::error::{Error, Result};
use crate::models::users::{Actor, Role, Scope, User};
use crate::state::AppState;
use crate::store::{PutItem, Query};

pub struct ListUsersFilter {
    pub organization_id: Option<String>,
    pub company_id: Option<String>,
}

pub async fn list_users(state: &AppState, actor: &Actor, filter: ListUsersFilter) -> Result<Vec<User>> {
    let scope_organization_id = match actor.role {
        Role::SystemAdmin => filter.organization_id,
        Role::OrgAdmin => actor.scope.organization_id.clone(),
        Role::CompanyAdmin => None,
        Role::User => {
            return Err(Error::ForbiddenRole("users may not list other users".into()));
        }
    };
    let scope_company_id = match actor.role {
        Role::CompanyAdmin => actor.scope.company_id.clone(),
        _ => filter.company_id,
    };

    let items = state.store.query(&Query::gsi1("USERS")).await?;
    let mut users = items
        .into_iter()
        .map(|item| crate::store::decode(item.value))
        .collect::<Result<Vec<User>>>()?;

    if let Some(organization_id) = &scope_organization_id {
        users.retain(|u| u.scope.organization_id.as_deref() == Some(organization_id.as_str()));
    }
    if let Some(company_id) = &scope_company_id {
        users.retain(|u| u.scope.company_id.as_deref() == Some(company_id.as_str()));
    }

    Ok(users)
}

pub struct CreateUserInput {
    pub email: String,
    pub name: String,
    pub role: Role,
    pub organization_id: Option<String>,
    pub company_id: Option<String>,
    pub department_id: Option<String>,
    pub temporary_password: Option<String>,
}

pub struct CreateUserOutput {
    pub user: User,
    pub temporary_password: String,
}

pub async fn create_user(
    state: &AppState,
    actor: &Actor,
    input: CreateUserInput,
) -> Result<CreateUserOutput> {
    if !access::can_create_user(
        actor,
        input.role,
        input.organization_id.as_deref(),
        input.company_id.as_deref(),
    ) {
        return Err(Error::ForbiddenRole(format!(
            "{:?} may not create a {:?} in the requested scope",
            actor.role, input.role
        )));
    }

    let (subject, temporary_password) = state
        .identity
        .admin_create_user(&input.email, &input.name, input.temporary_password)
        .await?;

    let now = Utc::now();
    let user = User {
        user_id: subject,
        email: input.email,
        name: input.name,
        role: input.role,
        scope: Scope {
            organization_id: input.organization_id,
            company_id: input.company_id,
            department_id: input.department_id,
        },
        created_at: now,
        updated_at: now,
    };

    if !user.scope_is_consistent() {
        return Err(Error::Validation(crate::error::ValidationErrors::Single {
            field: "scope".into(),
            message: format!("role {:?} requires enclosing scope ids", user.role),
        }));
    }

    state
        .store
        .put_item(
            crate::store::ItemKey::new(format!("USER#{}", user.user_id), "META".to_string()),
            crate::store::encode(&user)?,
            PutItem {
                gsi1_pk: Some("USERS".to_string()),
                gsi1_sk: Some(format!("USER#{}", user.created_at.to_rfc3339())),
                ..Default::default()
            },
        )
        .await?;

    Ok(CreateUserOutput {
        user,
        temporary_password,
    })
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

    fn org_admin() -> Actor {
        Actor {
            user_id: "oa1".into(),
            role: Role::OrgAdmin,
            scope: Scope {
                organization_id: Some("org-1".into()),
                company_id: None,
                department_id: None,
            },
        }
    }

    #[tokio::test]
    async fn org_admin_creates_user_within_own_org() {
        let state = test_state();
        let output = create_user(
            &state,
            &org_admin(),
            CreateUserInput {
                email: "new@b.com".into(),
                name: "New".into(),
                role: Role::User,
                organization_id: Some("org-1".into()),
                company_id: Some("c-1".into()),
                department_id: None,
                temporary_password: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(output.user.scope.organization_id.as_deref(), Some("org-1"));
        assert!(output.temporary_password.len() >= 12);
    }

    #[tokio::test]
    async fn org_admin_creating_user_in_other_org_is_forbidden() {
        let state = test_state();
        let result = create_user(
            &state,
            &org_admin(),
            CreateUserInput {
                email: "new@b.com".into(),
                name: "New".into(),
                role: Role::User,
                organization_id: Some("org-2".into()),
                company_id: None,
                department_id: None,
                temporary_password: None,
            },
        )
        .await;
        assert!(matches!(result, Err(Error::ForbiddenRole(_))));
    }

    #[tokio::test]
    async fn plain_user_cannot_list_users() {
        let state = test_state();
        let actor = Actor {
            user_id: "u1".into(),
            role: Role::User,
            scope: Scope::default(),
        };
        let result = list_users(
            &state,
            &actor,
            ListUsersFilter {
                organization_id: None,
                company_id: None,
            },
        )
        .await;
        assert!(matches!(result, Err(Error::ForbiddenRole(_))));
    }
}
