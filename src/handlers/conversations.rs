use axum::extract::{Path, Query as QueryExtractor, State};
use axum::Json;

use crate::error::{Error, Result};
use crate::models::requests::ListConversationsQuery;
use crate::services::chat as chat_service;
use crate::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    QueryExtractor(query): QueryExtractor<ListConversationsQuery>,
) -> Result<Json<serde_json::Value>> {
    let conversations = chat_service::list_conversations(&state, &query.user_id, query.limit).await?;
    Ok(Json(serde_json::json!({ "conversations": conversations })))
}

pub async fn get(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let found = chat_service::get_conversation(&state, &conversation_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("conversation {conversation_id}")))?;

    Ok(Json(serde_json::json!({
        "conversation": found.conversation,
        "messages": found.messages,
    })))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let deleted = chat_service::delete_conversation(&state, &conversation_id).await?;
    if !deleted {
        return Err(Error::NotFound(format!("conversation {conversation_id}")));
    }
    Ok(Json(serde_json::json!({ "deleted": true })))
}
