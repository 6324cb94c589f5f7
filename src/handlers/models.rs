use axum::Json;
use serde::Serialize;
use serde_json::Value;

use crate::providers::registry::MODEL_REGISTRY;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ModelInfoOut {
    model_id: &'static str,
    provider: &'static str,
    display_name: &'static str,
    description: &'static str,
    category: &'static str,
    supports_images: bool,
    max_tokens: u32,
    pricing: PricingOut,
}

#[derive(Serialize)]
struct PricingOut {
    input: f64,
    output: f64,
}

pub async fn list_models() -> Json<Value> {
    let mut models: Vec<ModelInfoOut> = MODEL_REGISTRY
        .iter()
        .map(|(model_id, info)| ModelInfoOut {
            model_id,
            provider: info.provider.as_str(),
            display_name: info.display_name,
            description: info.description,
            category: info.category,
            supports_images: info.supports_images,
            max_tokens: info.max_tokens,
            pricing: PricingOut {
                input: info.pricing.input,
                output: info.pricing.output,
            },
        })
        .collect();
    models.sort_by_key(|m| m.model_id);

    Json(serde_json::json!({ "models": models }))
}
