use axum::extract::State;
use axum::{Extension, Json};

use crate::error::Result;
use crate::models::requests::{ChatTurnRequest, ChatTurnResponse, UsageInfo};
use crate::models::users::Actor;
use crate::providers::{ChatMessage, ChatRole};
use crate::services::chat as chat_service;
use crate::state::AppState;

fn to_chat_role(role: crate::models::conversations::MessageRole) -> ChatRole {
    match role {
        crate::models::conversations::MessageRole::User => ChatRole::User,
        crate::models::conversations::MessageRole::Assistant => ChatRole::Assistant,
    }
}

pub async fn chat(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(body): Json<ChatTurnRequest>,
) -> Result<Json<ChatTurnResponse>> {
    let messages = body
        .messages
        .into_iter()
        .map(|m| ChatMessage {
            role: to_chat_role(m.role),
            content: m.content,
            attachments: vec![],
        })
        .collect();

    let output = chat_service::handle_turn(
        &state,
        chat_service::TurnInput {
            model_id: body.model,
            messages,
            system_prompt: body.system_prompt,
            max_tokens: body.max_tokens,
            temperature: body.temperature,
            conversation_id: body.conversation_id,
            user_id: body.user_id,
            file_ids: body.file_ids,
            save_history: body.save_history.unwrap_or(true),
            actor,
        },
    )
    .await?;

    Ok(Json(ChatTurnResponse {
        content: output.content,
        model: output.model_id,
        provider: output.provider.to_string(),
        conversation_id: output.conversation_id,
        usage: output.usage.map(|(input_tokens, output_tokens)| UsageInfo {
            input_tokens,
            output_tokens,
        }),
    }))
}
