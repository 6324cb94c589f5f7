//! Provider abstraction (§4.3): normalizes two dissimilar LLM APIs behind one
//! `ChatProvider` trait, and the model registry that is the single source of
//! truth for dispatch (which provider serves a model id) and cost (pricing).

pub mod bedrock;
pub mod gemini;
pub mod registry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model_id: String,
    pub messages: Vec<ChatMessage>,
    pub system_prompt: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Default)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: String,
    pub usage: Option<Usage>,
}

/// Image media types the unified-converse provider recognizes (§4.3.1).
/// Anything else is dropped silently from the provider payload, though the
/// saved message keeps the original attachment.
pub const CONVERSE_IMAGE_MEDIA_TYPES: &[&str] =
    &["image/png", "image/jpeg", "image/gif", "image/webp"];

#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn invoke(&self, request: ChatRequest) -> Result<ChatResponse>;
}

/// Test double, kept unconditionally public (mirrors `store::memory` and
/// `identity::memory`) so both in-crate unit tests and the external
/// `tests/` integration crate can depend on it.
pub mod testing {
    use super::{ChatProvider, ChatRequest, ChatResponse, Usage};
    use crate::error::Result;
    use async_trait::async_trait;

    /// A canned `ChatProvider` for service/handler tests: echoes the last
    /// user message back with a fixed token usage so cost computation has
    /// something deterministic to check.
    pub struct StubProvider {
        pub input_tokens: u64,
        pub output_tokens: u64,
    }

    impl Default for StubProvider {
        fn default() -> Self {
            Self {
                input_tokens: 10,
                output_tokens: 20,
            }
        }
    }

    #[async_trait]
    impl ChatProvider for StubProvider {
        async fn invoke(&self, request: ChatRequest) -> Result<ChatResponse> {
            let reply = request
                .messages
                .last()
                .map(|m| format!("echo: {}", m.content))
                .unwrap_or_default();
            Ok(ChatResponse {
                content: reply,
                usage: Some(Usage {
                    input_tokens: self.input_tokens,
                    output_tokens: self.output_tokens,
                }),
            })
        }
    }
}
