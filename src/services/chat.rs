//! Chat orchestrator (§4.6): validates, assembles RAG context, dispatches to
//! the registry-selected provider, computes cost, and persists the turn.

use chrono::Utc;
use futures::future::join_all;
use uuid::Uuid;

use crate::error::{Error, Result, ValidationErrors};
use crate::models::conversations::{Conversation, ConversationMessage, MessageRole};
use crate::models::users::Actor;
use crate::providers::registry::{self, ModelInfo};
use crate::providers::{ChatMessage, ChatRequest, ChatRole};
use crate::services::files;
use crate::state::AppState;
use crate::store::{ItemKey, PutItem, Query};

const RAG_INSTRUCTION: &str =
    "以下の参考資料を踏まえて回答してください。資料に記載のない内容は推測しないでください。";
const RAG_CONTENT_OPEN: &str = "--- ファイル内容 ---";
const RAG_CONTENT_CLOSE: &str = "--- ファイル終了 ---";

pub struct TurnInput {
    pub model_id: String,
    pub messages: Vec<ChatMessage>,
    pub system_prompt: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub conversation_id: Option<String>,
    pub user_id: Option<String>,
    pub file_ids: Vec<String>,
    pub save_history: bool,
    pub actor: Actor,
}

pub struct TurnOutput {
    pub content: String,
    pub model_id: String,
    pub provider: &'static str,
    pub conversation_id: Option<String>,
    pub usage: Option<(u64, u64)>,
}

fn conversation_key(conversation_id: &str) -> ItemKey {
    ItemKey::new(format!("CONV#{conversation_id}"), "META".to_string())
}

fn message_key(conversation_id: &str, message: &ConversationMessage) -> ItemKey {
    ItemKey::new(format!("CONV#{conversation_id}"), message.sort_key())
}

async fn assemble_system_prompt(
    state: &AppState,
    actor: &Actor,
    file_ids: &[String],
    system_prompt: Option<String>,
) -> Result<Option<String>> {
    if file_ids.is_empty() {
        return Ok(system_prompt);
    }

    // Files the caller cannot access, or that do not exist, are skipped
    // silently rather than erroring (§4.6 step 2) — a guessed id must not
    // leak whether it exists.
    let texts = join_all(file_ids.iter().map(|file_id| async move {
        match files::get_accessible_file(state, file_id, actor).await {
            Ok(Some(file)) => files::read_text(state, &file).await.ok(),
            _ => None,
        }
    }))
    .await;

    let bodies: Vec<String> = texts.into_iter().flatten().collect();
    if bodies.is_empty() {
        return Ok(system_prompt);
    }

    let joined = bodies.join("\n\n");
    let rag_block = format!("{RAG_INSTRUCTION}\n{RAG_CONTENT_OPEN}\n{joined}\n{RAG_CONTENT_CLOSE}");

    Ok(Some(match system_prompt {
        Some(existing) => format!("{existing}\n\n{rag_block}"),
        None => rag_block,
    }))
}

fn compute_cost(model: &ModelInfo, input_tokens: u64, output_tokens: u64) -> f64 {
    (input_tokens as f64 / 1_000_000.0) * model.pricing.input
        + (output_tokens as f64 / 1_000_000.0) * model.pricing.output
}

pub async fn handle_turn(state: &AppState, input: TurnInput) -> Result<TurnOutput> {
    if input.messages.is_empty() {
        return Err(Error::Validation(ValidationErrors::Single {
            field: "messages".into(),
            message: "at least one message is required".into(),
        }));
    }
    let model = registry::lookup(&input.model_id)
        .ok_or_else(|| Error::UnknownModel(input.model_id.clone()))?;

    let system_prompt = assemble_system_prompt(
        state,
        &input.actor,
        &input.file_ids,
        input.system_prompt.clone(),
    )
    .await?;

    let request = ChatRequest {
        model_id: input.model_id.clone(),
        messages: input.messages.clone(),
        system_prompt,
        max_tokens: input.max_tokens.or(Some(model.max_tokens)),
        temperature: input.temperature,
    };

    let provider = state.provider_for(model.provider);
    let response = provider.invoke(request).await?;

    let (input_tokens, output_tokens, cost) = match &response.usage {
        Some(usage) => (
            usage.input_tokens,
            usage.output_tokens,
            compute_cost(model, usage.input_tokens, usage.output_tokens),
        ),
        None => (0, 0, 0.0),
    };

    let conversation_id = if input.save_history {
        match persist_turn(state, &input, &response.content, input_tokens, output_tokens, cost).await {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::error!(error = %e, "failed to persist chat turn");
                None
            }
        }
    } else {
        None
    };

    Ok(TurnOutput {
        content: response.content,
        model_id: input.model_id,
        provider: model.provider.as_str(),
        conversation_id,
        usage: response.usage.map(|u| (u.input_tokens, u.output_tokens)),
    })
}

async fn persist_turn(
    state: &AppState,
    input: &TurnInput,
    assistant_content: &str,
    input_tokens: u64,
    output_tokens: u64,
    cost: f64,
) -> Result<String> {
    let conversation_id = input
        .conversation_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let now = Utc::now();
    let existing = state.store.get_item(&conversation_key(&conversation_id)).await?;

    if existing.is_none() {
        let user_id = input
            .user_id
            .clone()
            .unwrap_or_else(|| input.actor.user_id.clone());
        let title = input
            .messages
            .last()
            .map(|m| Conversation::title_from(&m.content))
            .unwrap_or_default();

        let conversation = Conversation {
            conversation_id: conversation_id.clone(),
            title,
            user_id: user_id.clone(),
            organization_id: input.actor.scope.organization_id.clone(),
            company_id: input.actor.scope.company_id.clone(),
            department_id: input.actor.scope.department_id.clone(),
            model_id: input.model_id.clone(),
            created_at: now,
            updated_at: now,
            message_count: 0,
            total_input_tokens: 0,
            total_output_tokens: 0,
            total_cost: 0.0,
        };

        state
            .store
            .put_item(
                conversation_key(&conversation_id),
                crate::store::encode(&conversation)?,
                PutItem {
                    gsi1_pk: Some(format!("USER#{user_id}")),
                    gsi1_sk: Some(format!("CONV#{}", now.to_rfc3339())),
                    ..Default::default()
                },
            )
            .await?;
    }

    let user_message = ConversationMessage {
        conversation_id: conversation_id.clone(),
        message_id: Uuid::new_v4().to_string(),
        role: MessageRole::User,
        content: input
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default(),
        model_id: None,
        input_tokens: 0,
        output_tokens: 0,
        cost: 0.0,
        created_at: now,
    };
    let assistant_message = ConversationMessage {
        conversation_id: conversation_id.clone(),
        message_id: Uuid::new_v4().to_string(),
        role: MessageRole::Assistant,
        content: assistant_content.to_string(),
        model_id: Some(input.model_id.clone()),
        input_tokens,
        output_tokens,
        cost,
        created_at: now,
    };

    let user_key = message_key(&conversation_id, &user_message);
    let assistant_key = message_key(&conversation_id, &assistant_message);

    // The two message writes MAY be parallelized (§5); the metadata update
    // below must observe both before it lands.
    let (user_write, assistant_write) = tokio::join!(
        state
            .store
            .put_item(user_key, crate::store::encode(&user_message)?, PutItem::default()),
        state.store.put_item(
            assistant_key,
            crate::store::encode(&assistant_message)?,
            PutItem::default(),
        )
    );
    user_write?;
    assistant_write?;

    state
        .store
        .increment_item(
            &conversation_key(&conversation_id),
            crate::store::Increments {
                message_count: 2,
                total_input_tokens: input_tokens,
                total_output_tokens: output_tokens,
                total_cost: cost,
            },
            serde_json::json!({ "updatedAt": now, "modelId": input.model_id }),
            Some(format!("CONV#{}", now.to_rfc3339())),
        )
        .await?;

    Ok(conversation_id)
}

pub struct ConversationWithMessages {
    pub conversation: Conversation,
    pub messages: Vec<ConversationMessage>,
}

pub async fn get_conversation(
    state: &AppState,
    conversation_id: &str,
) -> Result<Option<ConversationWithMessages>> {
    let Some(value) = state.store.get_item(&conversation_key(conversation_id)).await? else {
        return Ok(None);
    };
    let conversation: Conversation = crate::store::decode(value)?;

    let items = state
        .store
        .query(&Query::primary(format!("CONV#{conversation_id}")).with_sort_prefix("MSG#"))
        .await?;
    let messages = items
        .into_iter()
        .map(|item| crate::store::decode(item.value))
        .collect::<Result<Vec<ConversationMessage>>>()?;

    Ok(Some(ConversationWithMessages {
        conversation,
        messages,
    }))
}

pub async fn list_conversations(
    state: &AppState,
    user_id: &str,
    limit: Option<u32>,
) -> Result<Vec<Conversation>> {
    let items = state
        .store
        .query(&Query::gsi1(format!("USER#{user_id}")).with_sort_prefix("CONV#"))
        .await?;

    let mut conversations = items
        .into_iter()
        .map(|item| crate::store::decode(item.value))
        .collect::<Result<Vec<Conversation>>>()?;

    conversations.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    if let Some(limit) = limit {
        conversations.truncate(limit as usize);
    }
    Ok(conversations)
}

pub async fn delete_conversation(state: &AppState, conversation_id: &str) -> Result<bool> {
    if state
        .store
        .get_item(&conversation_key(conversation_id))
        .await?
        .is_none()
    {
        return Ok(false);
    }

    let items = state
        .store
        .query(&Query::primary(format!("CONV#{conversation_id}")))
        .await?;
    for item in items {
        state.store.delete_item(&item.key).await?;
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::identity::memory::MemoryIdentity;
    use crate::models::users::Scope;
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

    fn actor() -> Actor {
        Actor {
            user_id: "u1".into(),
            role: crate::models::users::Role::User,
            scope: Scope::default(),
        }
    }

    fn turn(model_id: &str, save_history: bool) -> TurnInput {
        TurnInput {
            model_id: model_id.into(),
            messages: vec![ChatMessage {
                role: ChatRole::User,
                content: "How old is Alice?".into(),
                attachments: vec![],
            }],
            system_prompt: None,
            max_tokens: None,
            temperature: None,
            conversation_id: None,
            user_id: Some("u1".into()),
            file_ids: vec![],
            save_history,
            actor: actor(),
        }
    }

    #[tokio::test]
    async fn unknown_model_is_rejected() {
        let state = test_state();
        let result = handle_turn(&state, turn("not-a-real-model", true)).await;
        assert!(matches!(result, Err(Error::UnknownModel(_))));
    }

    #[tokio::test]
    async fn sonnet_turn_computes_cost_from_registry_pricing() {
        let state = test_state();
        let output = handle_turn(&state, turn("us.anthropic.claude-sonnet-4-5-20250929-v1:0", true))
            .await
            .unwrap();
        assert_eq!(output.provider, "bedrock");
        let conversation_id = output.conversation_id.unwrap();

        let loaded = get_conversation(&state, &conversation_id).await.unwrap().unwrap();
        assert_eq!(loaded.conversation.message_count, 2);
        let expected_cost = (10.0 / 1_000_000.0) * 3.0 + (20.0 / 1_000_000.0) * 15.0;
        assert!((loaded.conversation.total_cost - expected_cost).abs() < 1e-9);
    }

    #[tokio::test]
    async fn conversation_stays_listed_after_a_second_turn_increments_its_counters() {
        let state = test_state();
        let first = handle_turn(&state, turn("gemini-3-flash-preview", true))
            .await
            .unwrap();
        let conversation_id = first.conversation_id.unwrap();

        let mut second_turn = turn("gemini-3-flash-preview", true);
        second_turn.conversation_id = Some(conversation_id.clone());
        handle_turn(&state, second_turn).await.unwrap();

        let listed = list_conversations(&state, "u1", None).await.unwrap();
        assert!(listed.iter().any(|c| c.conversation_id == conversation_id));
        assert_eq!(
            listed.iter().find(|c| c.conversation_id == conversation_id).unwrap().message_count,
            4
        );
    }

    #[tokio::test]
    async fn save_history_false_never_persists() {
        let state = test_state();
        let output = handle_turn(&state, turn("gemini-3-flash-preview", false))
            .await
            .unwrap();
        assert!(output.conversation_id.is_none());
    }

    #[tokio::test]
    async fn empty_messages_rejected() {
        let state = test_state();
        let mut input = turn("gemini-3-flash-preview", true);
        input.messages.clear();
        let result = handle_turn(&state, input).await;
        assert!(matches!(result, Err(Error::Validation(_))));
    }
}
