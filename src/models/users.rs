use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// The four-level role hierarchy the access policy is built on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    User,
    CompanyAdmin,
    OrgAdmin,
    SystemAdmin,
}

/// The scope a user or file is attached to. Some parts may be absent —
/// `system_admin` users and `system`-visibility files carry none of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
    pub organization_id: Option<String>,
    pub company_id: Option<String>,
    pub department_id: Option<String>,
}

/// `PK="USER#"+userId, SK="META"`, projected into GSI1 (`GSI1PK="USERS"`) for
/// the admin user-listing queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub scope: Scope,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Every non-system user must carry all enclosing scope identifiers for
    /// scopes at or above their role (§3 invariant).
    pub fn scope_is_consistent(&self) -> bool {
        match self.role {
            Role::SystemAdmin => true,
            Role::OrgAdmin => self.scope.organization_id.is_some(),
            Role::CompanyAdmin => {
                self.scope.organization_id.is_some() && self.scope.company_id.is_some()
            }
            Role::User => true,
        }
    }
}

/// The authenticated caller, as extracted from the request by the auth
/// middleware. Distinct from `User` because in some flows (e.g. unauthenticated
/// signup) only a subset of this is available.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub user_id: String,
    pub role: Role,
    pub scope: Scope,
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.user_id.clone(),
            role: user.role,
            scope: user.scope.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn org_admin_without_org_is_inconsistent() {
        let user = User {
            user_id: "u1".into(),
            email: "a@b.com".into(),
            name: "A".into(),
            role: Role::OrgAdmin,
            scope: Scope::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(!user.scope_is_consistent());
    }

    #[test]
    fn system_admin_scope_always_consistent() {
        let user = User {
            user_id: "u1".into(),
            email: "a@b.com".into(),
            name: "A".into(),
            role: Role::SystemAdmin,
            scope: Scope::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(user.scope_is_consistent());
    }
}
