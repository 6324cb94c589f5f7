use axum::extract::{Query as QueryExtractor, State};
use axum::Json;

use crate::error::Result;
use crate::models::requests::{
    ConfirmSignUpRequest, ProfileQuery, SignInRequest, SignInResponse, SignUpRequest, SignUpResponse,
    UpdateProfileRequest,
};
use crate::services::auth as auth_service;
use crate::state::AppState;
use crate::validation::{validate_email, validate_password};

pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<SignUpRequest>,
) -> Result<Json<SignUpResponse>> {
    validate_email(&body.email)?;
    validate_password(&body.password)?;

    let output = auth_service::sign_up(&state, &body.email, &body.password, &body.name).await?;
    Ok(Json(SignUpResponse {
        user_id: output.user_id,
        confirmed: output.confirmed,
    }))
}

pub async fn confirm(
    State(state): State<AppState>,
    Json(body): Json<ConfirmSignUpRequest>,
) -> Result<Json<serde_json::Value>> {
    auth_service::confirm_sign_up(&state, &body.email, &body.code).await?;
    Ok(Json(serde_json::json!({ "confirmed": true })))
}

pub async fn signin(
    State(state): State<AppState>,
    Json(body): Json<SignInRequest>,
) -> Result<Json<SignInResponse>> {
    let output = auth_service::sign_in(&state, &body.email, &body.password).await?;
    Ok(Json(SignInResponse {
        access_token: output.access_token,
        id_token: output.id_token,
        refresh_token: output.refresh_token,
        expires_in: output.expires_in,
        user: output.user,
    }))
}

pub async fn get_profile(
    State(state): State<AppState>,
    QueryExtractor(query): QueryExtractor<ProfileQuery>,
) -> Result<Json<crate::models::users::User>> {
    let user = auth_service::get_user(&state, &query.user_id)
        .await?
        .ok_or_else(|| crate::error::Error::NotFound(format!("user {}", query.user_id)))?;
    Ok(Json(user))
}

pub async fn update_profile(
    State(state): State<AppState>,
    QueryExtractor(query): QueryExtractor<ProfileQuery>,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<crate::models::users::User>> {
    let user = auth_service::update_profile(&state, &query.user_id, body.name).await?;
    Ok(Json(user))
}
