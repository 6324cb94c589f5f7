//! The unified-converse provider (§4.3.1): translates the neutral
//! `ChatRequest` into Bedrock's Converse API content-block shape and back.

use async_trait::async_trait;
use aws_sdk_bedrockruntime::types::{
    ContentBlock, ConversationRole, ImageBlock, ImageFormat, ImageSource, InferenceConfiguration,
    Message as BedrockMessage, SystemContentBlock,
};
use aws_sdk_bedrockruntime::Client;
use aws_smithy_types::Blob;

use crate::error::{Error, Result};

use super::{ChatProvider, ChatRequest, ChatResponse, ChatRole, Usage, CONVERSE_IMAGE_MEDIA_TYPES};

pub struct BedrockConverseProvider {
    client: Client,
}

impl BedrockConverseProvider {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn image_format(media_type: &str) -> Option<ImageFormat> {
    match media_type {
        "image/png" => Some(ImageFormat::Png),
        "image/jpeg" => Some(ImageFormat::Jpeg),
        "image/gif" => Some(ImageFormat::Gif),
        "image/webp" => Some(ImageFormat::Webp),
        _ => None,
    }
}

fn to_bedrock_message(message: &super::ChatMessage) -> Result<BedrockMessage> {
    let role = match message.role {
        ChatRole::User => ConversationRole::User,
        ChatRole::Assistant => ConversationRole::Assistant,
    };

    let mut blocks = vec![ContentBlock::Text(message.content.clone())];

    for attachment in &message.attachments {
        if !CONVERSE_IMAGE_MEDIA_TYPES.contains(&attachment.media_type.as_str()) {
            // Unknown attachment types are dropped silently from the provider
            // payload; the saved message keeps them regardless (§4.3.1).
            continue;
        }
        let Some(format) = image_format(&attachment.media_type) else {
            continue;
        };
        let image = ImageBlock::builder()
            .format(format)
            .source(ImageSource::Bytes(Blob::new(attachment.bytes.clone())))
            .build()
            .map_err(|e| Error::ProviderError(format!("image block build: {e}")))?;
        blocks.push(ContentBlock::Image(image));
    }

    BedrockMessage::builder()
        .role(role)
        .set_content(Some(blocks))
        .build()
        .map_err(|e| Error::ProviderError(format!("message build: {e}")))
}

#[async_trait]
impl ChatProvider for BedrockConverseProvider {
    async fn invoke(&self, request: ChatRequest) -> Result<ChatResponse> {
        let messages = request
            .messages
            .iter()
            .map(to_bedrock_message)
            .collect::<Result<Vec<_>>>()?;

        let inference_config = InferenceConfiguration::builder()
            .max_tokens(request.max_tokens.unwrap_or(4096) as i32)
            .temperature(request.temperature.unwrap_or(0.7))
            .build();

        let mut call = self
            .client
            .converse()
            .model_id(&request.model_id)
            .set_messages(Some(messages))
            .inference_config(inference_config);

        if let Some(system_prompt) = &request.system_prompt {
            call = call.system(SystemContentBlock::Text(system_prompt.clone()));
        }

        let output = call
            .send()
            .await
            .map_err(|e| Error::ProviderError(format!("converse: {e}")))?;

        let content = output
            .output()
            .and_then(|o| o.as_message().ok())
            .map(|m| {
                m.content()
                    .iter()
                    .filter_map(|block| block.as_text().ok())
                    .cloned()
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let usage = output.usage().map(|u| Usage {
            input_tokens: u.input_tokens().max(0) as u64,
            output_tokens: u.output_tokens().max(0) as u64,
        });

        Ok(ChatResponse { content, usage })
    }
}
