use axum::extract::{Query as QueryExtractor, State};
use axum::{Extension, Json};

use crate::error::Result;
use crate::models::requests::{CreateUserRequest, CreateUserResponse, ListUsersQuery};
use crate::models::users::Actor;
use crate::services::admin as admin_service;
use crate::state::AppState;

pub async fn list_users(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    QueryExtractor(query): QueryExtractor<ListUsersQuery>,
) -> Result<Json<serde_json::Value>> {
    let users = admin_service::list_users(
        &state,
        &actor,
        admin_service::ListUsersFilter {
            organization_id: query.organization_id,
            company_id: query.company_id,
        },
    )
    .await?;
    Ok(Json(serde_json::json!({ "users": users })))
}

pub async fn create_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(body): Json<CreateUserRequest>,
) -> Result<Json<CreateUserResponse>> {
    let output = admin_service::create_user(
        &state,
        &actor,
        admin_service::CreateUserInput {
            email: body.email,
            name: body.name,
            role: body.role,
            organization_id: body.organization_id,
            company_id: body.company_id,
            department_id: body.department_id,
            temporary_password: body.temporary_password,
        },
    )
    .await?;

    Ok(Json(CreateUserResponse {
        user: output.user,
        temporary_password: output.temporary_password,
    }))
}
