use std::str::FromStr;

use axum::extract::{Path, Query as QueryExtractor, State};
use axum::Json;

use crate::error::{Error, Result};
use crate::models::files::FileType;
use crate::models::users::{Actor, Scope};
use crate::services::files as file_service;
use crate::state::AppState;

use crate::models::requests::{
    DeleteFileQuery, ListFilesQuery, QueryFileRequest, QueryFileResponse, UpdateFileVisibilityRequest,
    UploadFileRequest, UploadFileResponse,
};

fn actor_from(user_id: String, role: crate::models::users::Role, scope: Scope) -> Actor {
    Actor {
        user_id,
        role,
        scope,
    }
}

pub async fn upload(
    State(state): State<AppState>,
    Json(body): Json<UploadFileRequest>,
) -> Result<Json<UploadFileResponse>> {
    let file_type = FileType::from_str(&body.file_type)
        .map_err(|_| Error::UnsupportedFileType(body.file_type.clone()))?;

    let output = file_service::upload(
        &state,
        file_service::UploadInput {
            file_name: body.file_name,
            file_type,
            mime_type: body.mime_type,
            file_data_base64: body.file_data_base64,
            user_id: body.user_id,
            user_role: body.user_role,
            organization_id: body.organization_id,
            company_id: body.company_id,
            department_id: body.department_id,
            visibility: body.visibility.unwrap_or(crate::models::files::Visibility::Private),
            category: body
                .category
                .unwrap_or(crate::models::files::FileCategory::RagSource),
            description: body.description,
        },
    )
    .await?;

    Ok(Json(UploadFileResponse {
        file_id: output.file_id,
        file_name: output.file_name,
        status: output.status,
        uploaded_at: output.uploaded_at,
    }))
}

pub async fn list(
    State(state): State<AppState>,
    QueryExtractor(query): QueryExtractor<ListFilesQuery>,
) -> Result<Json<serde_json::Value>> {
    let actor = actor_from(
        query.user_id,
        query.user_role,
        Scope {
            organization_id: query.organization_id,
            company_id: query.company_id,
            department_id: query.department_id,
        },
    );

    let files = file_service::list_for_actor(
        &state,
        &actor,
        file_service::ListFilter {
            category: query.category,
        },
    )
    .await?;

    Ok(Json(serde_json::json!({ "files": files })))
}

pub async fn get(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Json<crate::models::files::FileRecord>> {
    let file = file_service::get_file(&state, &file_id)
        .await?
        .ok_or_else(|| crate::error::Error::NotFound(format!("file {file_id}")))?;
    Ok(Json(file))
}

pub async fn update_visibility(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
    Json(body): Json<UpdateFileVisibilityRequest>,
) -> Result<Json<crate::models::files::FileRecord>> {
    let actor = actor_from(body.user_id, body.user_role, Scope::default());
    let file = file_service::update_visibility(&state, &file_id, &actor, body.visibility).await?;
    Ok(Json(file))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
    QueryExtractor(query): QueryExtractor<DeleteFileQuery>,
) -> Result<Json<serde_json::Value>> {
    let actor = actor_from(query.user_id, query.user_role, Scope::default());
    file_service::delete(&state, &file_id, &actor).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

pub async fn query_file(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
    Json(body): Json<QueryFileRequest>,
) -> Result<Json<QueryFileResponse>> {
    let file = file_service::get_file(&state, &file_id)
        .await?
        .ok_or_else(|| crate::error::Error::NotFound(format!("file {file_id}")))?;

    let result = file_service::query_file(&state, &file, &body.question).await?;
    Ok(Json(QueryFileResponse {
        answer: result.answer,
        source_data: result.source_data,
    }))
}
