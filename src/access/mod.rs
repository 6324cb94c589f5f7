//! Pure RBAC predicates (§4.4). Kept free of I/O so the service layer can
//! unit-test every branch of the matrix without a store or identity provider.

use crate::models::files::{FileRecord, Visibility};
use crate::models::users::{Actor, Role};

/// The visibilities an actor's role may create or relabel a file into.
pub fn allowed_visibilities(role: Role) -> &'static [Visibility] {
    match role {
        Role::SystemAdmin => &[
            Visibility::Private,
            Visibility::Department,
            Visibility::Company,
            Visibility::Organization,
            Visibility::System,
        ],
        Role::OrgAdmin => &[
            Visibility::Private,
            Visibility::Department,
            Visibility::Company,
            Visibility::Organization,
        ],
        Role::CompanyAdmin => &[Visibility::Private, Visibility::Department, Visibility::Company],
        Role::User => &[Visibility::Private],
    }
}

pub fn visibility_allowed_for(role: Role, visibility: Visibility) -> bool {
    allowed_visibilities(role).contains(&visibility)
}

/// `canAccessFile(file, actor)` (§4.4).
pub fn can_access_file(file: &FileRecord, actor: &Actor) -> bool {
    if file.user_id == actor.user_id {
        return true;
    }
    if actor.role == Role::SystemAdmin {
        return true;
    }
    match file.visibility {
        Visibility::System => true,
        Visibility::Organization => {
            file.organization_id.is_some() && file.organization_id == actor.scope.organization_id
        }
        Visibility::Company => file.company_id.is_some() && file.company_id == actor.scope.company_id,
        Visibility::Department => {
            file.company_id.is_some()
                && file.company_id == actor.scope.company_id
                && file.department_id.is_some()
                && file.department_id == actor.scope.department_id
        }
        Visibility::Private => false,
    }
}

/// The admin-action matrix (§4.4): whether `actor` may create a user with
/// `target_role` inside `target_organization_id`/`target_company_id`.
pub fn can_create_user(
    actor: &Actor,
    target_role: Role,
    target_organization_id: Option<&str>,
    target_company_id: Option<&str>,
) -> bool {
    match actor.role {
        Role::SystemAdmin => true,
        Role::OrgAdmin => {
            (target_role == Role::CompanyAdmin || target_role == Role::User)
                && actor.scope.organization_id.as_deref() == target_organization_id
        }
        Role::CompanyAdmin => {
            target_role == Role::User && actor.scope.company_id.as_deref() == target_company_id
        }
        Role::User => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::files::{FileCategory, FileStatus, FileType};
    use crate::models::users::Scope;
    use chrono::Utc;

    fn actor(role: Role, org: Option<&str>, company: Option<&str>, dept: Option<&str>) -> Actor {
        Actor {
            user_id: "actor-1".into(),
            role,
            scope: Scope {
                organization_id: org.map(String::from),
                company_id: company.map(String::from),
                department_id: dept.map(String::from),
            },
        }
    }

    fn file(
        user_id: &str,
        visibility: Visibility,
        org: Option<&str>,
        company: Option<&str>,
        dept: Option<&str>,
    ) -> FileRecord {
        FileRecord {
            file_id: "f1".into(),
            file_name: "a.txt".into(),
            file_type: FileType::Txt,
            mime_type: "text/plain".into(),
            blob_key: "k".into(),
            user_id: user_id.into(),
            created_by_role: Role::User,
            organization_id: org.map(String::from),
            company_id: company.map(String::from),
            department_id: dept.map(String::from),
            uploaded_at: Utc::now(),
            file_size: 0,
            status: FileStatus::Ready,
            visibility,
            category: FileCategory::RagSource,
            extracted_text: None,
            text_blob_key: None,
            description: None,
            error_message: None,
        }
    }

    #[test]
    fn owner_can_always_access_their_own_private_file() {
        let f = file("u1", Visibility::Private, None, None, None);
        let a = actor(Role::User, None, None, None);
        let a = Actor { user_id: "u1".into(), ..a };
        assert!(can_access_file(&f, &a));
    }

    #[test]
    fn stranger_cannot_access_private_file() {
        let f = file("u1", Visibility::Private, None, None, None);
        let a = actor(Role::User, None, None, None);
        assert!(!can_access_file(&f, &a));
    }

    #[test]
    fn system_admin_can_access_any_file() {
        let f = file("u1", Visibility::Private, None, None, None);
        let a = actor(Role::SystemAdmin, None, None, None);
        assert!(can_access_file(&f, &a));
    }

    #[test]
    fn company_visibility_requires_matching_company() {
        let f = file("u1", Visibility::Company, Some("org-1"), Some("c-1"), None);
        let same_company = actor(Role::User, Some("org-1"), Some("c-1"), None);
        let other_company = actor(Role::User, Some("org-1"), Some("c-2"), None);
        assert!(can_access_file(&f, &same_company));
        assert!(!can_access_file(&f, &other_company));
    }

    #[test]
    fn department_visibility_requires_matching_company_and_department() {
        let f = file(
            "u1",
            Visibility::Department,
            Some("org-1"),
            Some("c-1"),
            Some("d-1"),
        );
        let same = actor(Role::User, Some("org-1"), Some("c-1"), Some("d-1"));
        let other_dept = actor(Role::User, Some("org-1"), Some("c-1"), Some("d-2"));
        assert!(can_access_file(&f, &same));
        assert!(!can_access_file(&f, &other_dept));
    }

    #[test]
    fn user_may_only_create_private_files() {
        assert!(visibility_allowed_for(Role::User, Visibility::Private));
        assert!(!visibility_allowed_for(Role::User, Visibility::Company));
    }

    #[test]
    fn org_admin_may_create_company_admin_within_own_org() {
        let a = actor(Role::OrgAdmin, Some("org-1"), None, None);
        assert!(can_create_user(&a, Role::CompanyAdmin, Some("org-1"), None));
        assert!(!can_create_user(&a, Role::CompanyAdmin, Some("org-2"), None));
    }

    #[test]
    fn org_admin_creating_system_admin_is_forbidden() {
        let a = actor(Role::OrgAdmin, Some("org-1"), None, None);
        assert!(!can_create_user(&a, Role::SystemAdmin, Some("org-1"), None));
    }

    #[test]
    fn company_admin_may_only_create_users_in_own_company() {
        let a = actor(Role::CompanyAdmin, Some("org-1"), Some("c-1"), None);
        assert!(can_create_user(&a, Role::User, None, Some("c-1")));
        assert!(!can_create_user(&a, Role::User, None, Some("c-2")));
        assert!(!can_create_user(&a, Role::CompanyAdmin, None, Some("c-1")));
    }
}
