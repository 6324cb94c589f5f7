//! The process-wide model registry (§6): the single source of truth for
//! which provider serves a model id and what it costs. Pricing is part of
//! the external contract — changing it without a release note is a bug.

use once_cell::sync::Lazy;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderTag {
    Bedrock,
    Gemini,
}

impl ProviderTag {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderTag::Bedrock => "bedrock",
            ProviderTag::Gemini => "gemini",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Pricing {
    /// USD per 1,000,000 input tokens.
    pub input: f64,
    /// USD per 1,000,000 output tokens.
    pub output: f64,
}

#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub provider: ProviderTag,
    pub display_name: &'static str,
    pub description: &'static str,
    pub category: &'static str,
    pub supports_images: bool,
    pub max_tokens: u32,
    pub pricing: Pricing,
}

pub static MODEL_REGISTRY: Lazy<HashMap<&'static str, ModelInfo>> = Lazy::new(|| {
    let mut m = HashMap::new();

    m.insert(
        "us.anthropic.claude-sonnet-4-5-20250929-v1:0",
        ModelInfo {
            provider: ProviderTag::Bedrock,
            display_name: "Claude Sonnet 4.5",
            description: "Anthropic's flagship reasoning and coding model, served via the cross-region inference profile",
            category: "frontier",
            supports_images: true,
            max_tokens: 4096,
            pricing: Pricing { input: 3.0, output: 15.0 },
        },
    );
    m.insert(
        "us.anthropic.claude-haiku-4-5-20251001-v1:0",
        ModelInfo {
            provider: ProviderTag::Bedrock,
            display_name: "Claude Haiku 4.5",
            description: "Low-latency, low-cost Anthropic model for high-volume chat traffic",
            category: "fast",
            supports_images: true,
            max_tokens: 4096,
            pricing: Pricing { input: 0.8, output: 4.0 },
        },
    );
    m.insert(
        "gemini-3-flash-preview",
        ModelInfo {
            provider: ProviderTag::Gemini,
            display_name: "Gemini 3 Flash (Preview)",
            description: "Google's direct-SDK model, dispatched outside the cross-region inference profile",
            category: "fast",
            supports_images: true,
            max_tokens: 8192,
            pricing: Pricing { input: 0.5, output: 3.0 },
        },
    );
    m.insert(
        "gemini-3-pro-preview",
        ModelInfo {
            provider: ProviderTag::Gemini,
            display_name: "Gemini 3 Pro (Preview)",
            description: "Google's higher-capability direct-SDK model",
            category: "frontier",
            supports_images: true,
            max_tokens: 8192,
            pricing: Pricing { input: 1.25, output: 5.0 },
        },
    );

    m
});

pub fn lookup(model_id: &str) -> Option<&'static ModelInfo> {
    MODEL_REGISTRY.get(model_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sonnet_routes_to_bedrock_with_documented_pricing() {
        let info = lookup("us.anthropic.claude-sonnet-4-5-20250929-v1:0").unwrap();
        assert_eq!(info.provider, ProviderTag::Bedrock);
        assert_eq!(info.pricing.input, 3.0);
        assert_eq!(info.pricing.output, 15.0);
    }

    #[test]
    fn gemini_flash_routes_to_gemini_with_documented_pricing() {
        let info = lookup("gemini-3-flash-preview").unwrap();
        assert_eq!(info.provider, ProviderTag::Gemini);
        assert_eq!(info.pricing.input, 0.5);
        assert_eq!(info.pricing.output, 3.0);
    }

    #[test]
    fn unknown_model_id_is_absent() {
        assert!(lookup("gpt-5-turbo").is_none());
    }
}
