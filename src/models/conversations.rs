use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// `PK="CONV#"+conversationId, SK="META"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub conversation_id: String,
    pub title: String,
    pub user_id: String,
    pub organization_id: Option<String>,
    pub company_id: Option<String>,
    pub department_id: Option<String>,
    pub model_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub message_count: u64,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_cost: f64,
}

impl Conversation {
    /// Derives the title from the first user message: its first 50 chars.
    pub fn title_from(first_message: &str) -> String {
        first_message.chars().take(50).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// `PK="CONV#"+conversationId, SK="MSG#"+createdAt+"#"+messageId`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationMessage {
    pub conversation_id: String,
    pub message_id: String,
    pub role: MessageRole,
    pub content: String,
    pub model_id: Option<String>,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost: f64,
    pub created_at: DateTime<Utc>,
}

impl ConversationMessage {
    /// `SK` sort key: the ISO-8601 timestamp yields chronological scan order
    /// across turns. A single turn's user and assistant message share the
    /// same `createdAt`, so a role ordinal breaks the tie and keeps the
    /// user message first within that turn regardless of `messageId`.
    pub fn sort_key(&self) -> String {
        let role_ordinal = match self.role {
            MessageRole::User => 0,
            MessageRole::Assistant => 1,
        };
        format!(
            "MSG#{}#{role_ordinal}#{}",
            self.created_at.to_rfc3339(),
            self.message_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_truncates_to_fifty_chars() {
        let long = "x".repeat(80);
        assert_eq!(Conversation::title_from(&long).chars().count(), 50);
    }

    #[test]
    fn title_keeps_short_messages_intact() {
        assert_eq!(Conversation::title_from("hello"), "hello");
    }

    #[test]
    fn user_message_sorts_before_assistant_message_at_the_same_instant() {
        let now = Utc::now();
        let user = ConversationMessage {
            conversation_id: "c1".into(),
            message_id: "zzz-message-id".into(),
            role: MessageRole::User,
            content: "hi".into(),
            model_id: None,
            input_tokens: 0,
            output_tokens: 0,
            cost: 0.0,
            created_at: now,
        };
        let assistant = ConversationMessage {
            message_id: "aaa-message-id".into(),
            role: MessageRole::Assistant,
            ..user.clone()
        };
        assert!(user.sort_key() < assistant.sort_key());
    }
}
