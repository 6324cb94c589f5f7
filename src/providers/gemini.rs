//! The direct-SDK provider (§4.3.2): a thin REST client against the model
//! vendor's `generateContent` endpoint, mapping roles (`assistant→"model"`)
//! and the system prompt to a `system_instruction` field, grounded on the
//! role/attachment mapping conventions of a Gemini dialect translator.

use async_trait::async_trait;
use base64::Engine;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::{ChatProvider, ChatRequest, ChatResponse, ChatRole, Usage};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub struct GeminiProvider {
    http: reqwest::Client,
    api_key: SecretString,
}

impl GeminiProvider {
    pub fn new(http: reqwest::Client, api_key: SecretString) -> Self {
        Self { http, api_key }
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct Content {
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Vec<Candidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageMetadata {
    #[serde(rename = "promptTokenCount")]
    prompt_token_count: Option<u64>,
    #[serde(rename = "candidatesTokenCount")]
    candidates_token_count: Option<u64>,
}

fn to_content(message: &super::ChatMessage) -> Content {
    let role = match message.role {
        ChatRole::User => "user",
        ChatRole::Assistant => "model",
    };

    let mut parts = vec![Part::Text {
        text: message.content.clone(),
    }];

    for attachment in &message.attachments {
        if !attachment.media_type.starts_with("image/") {
            continue;
        }
        parts.push(Part::InlineData {
            inline_data: InlineData {
                mime_type: attachment.media_type.clone(),
                data: base64::engine::general_purpose::STANDARD.encode(&attachment.bytes),
            },
        });
    }

    Content {
        role: Some(role.to_string()),
        parts,
    }
}

#[async_trait]
impl ChatProvider for GeminiProvider {
    async fn invoke(&self, request: ChatRequest) -> Result<ChatResponse> {
        let contents = request.messages.iter().map(to_content).collect();

        let system_instruction = request.system_prompt.as_ref().map(|prompt| Content {
            role: None,
            parts: vec![Part::Text {
                text: prompt.clone(),
            }],
        });

        let body = GenerateContentRequest {
            contents,
            system_instruction,
            generation_config: GenerationConfig {
                max_output_tokens: request.max_tokens.unwrap_or(8192),
                temperature: request.temperature.unwrap_or(0.7),
            },
        };

        let url = format!("{API_BASE}/{}:generateContent", request.model_id);

        let response = self
            .http
            .post(url)
            .query(&[("key", self.api_key.expose_secret())])
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::ProviderError(format!("gemini request: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::ProviderError(format!(
                "gemini returned {status}: {text}"
            )));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| Error::ProviderError(format!("gemini response decode: {e}")))?;

        let content = parsed
            .candidates
            .first()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.clone())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let usage = parsed.usage_metadata.map(|u| Usage {
            input_tokens: u.prompt_token_count.unwrap_or(0),
            output_tokens: u.candidates_token_count.unwrap_or(0),
        });

        Ok(ChatResponse { content, usage })
    }
}
