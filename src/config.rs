use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub identity: IdentityConfig,
    pub providers: ProvidersConfig,
}

impl Config {
    /// Load configuration from environment variables, with defaults.
    ///
    /// Environment variables use the `BACKEND__SECTION__FIELD` convention,
    /// e.g. `BACKEND__STORAGE__MAIN_TABLE`. The handful of variables named
    /// directly by the external contract (`MAIN_TABLE`, `FILES_BUCKET`,
    /// `USER_POOL_ID`, `USER_POOL_CLIENT_ID`, `GEMINI_API_KEY`) are also read
    /// verbatim so the gateway can be dropped into the same Lambda
    /// environment as the reference deployment.
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let builder = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default())?)
            .add_source(
                config::Environment::with_prefix("BACKEND")
                    .prefix_separator("__")
                    .separator("__"),
            );

        let mut config: Config = builder.build()?.try_deserialize()?;

        if let Ok(v) = std::env::var("MAIN_TABLE") {
            config.storage.main_table = v;
        }
        if let Ok(v) = std::env::var("FILES_BUCKET") {
            config.storage.files_bucket = v;
        }
        if let Ok(v) = std::env::var("USER_POOL_ID") {
            config.identity.user_pool_id = v;
        }
        if let Ok(v) = std::env::var("USER_POOL_CLIENT_ID") {
            config.identity.user_pool_client_id = v;
        }
        if let Ok(v) = std::env::var("GEMINI_API_KEY") {
            config.providers.gemini_api_key = SecretString::from(v);
        }

        Ok(config)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// DynamoDB table name backing the single wide-table data model.
    pub main_table: String,
    /// S3 bucket backing the flat-namespace blob store.
    pub files_bucket: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            main_table: "rag-chat-gateway".to_string(),
            files_bucket: "rag-chat-gateway-files".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct IdentityConfig {
    pub user_pool_id: String,
    pub user_pool_client_id: String,
}

#[derive(Clone, Deserialize, Serialize)]
pub struct ProvidersConfig {
    /// Region hosting the cross-region inference profiles the unified
    /// converse provider targets (`us.*` model ids).
    pub bedrock_region: String,
    #[serde(skip_serializing, default = "SecretString::default")]
    pub gemini_api_key: SecretString,
    /// Request deadline applied to LLM invocations; the spec leaves this
    /// unspecified and suggests a 60s default.
    pub request_timeout_seconds: u64,
}

impl fmt::Debug for ProvidersConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvidersConfig")
            .field("bedrock_region", &self.bedrock_region)
            .field("gemini_api_key", &"<REDACTED>")
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .finish()
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            bedrock_region: "us-east-1".to_string(),
            gemini_api_key: SecretString::from(String::new()),
            request_timeout_seconds: 60,
        }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string_pretty(&self) {
            Ok(json) => write!(f, "{json}"),
            Err(_) => write!(f, "error serializing config"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_region() {
        let config = Config::default();
        assert_eq!(config.providers.bedrock_region, "us-east-1");
    }

    #[test]
    fn gemini_key_redacted_in_debug() {
        let config = ProvidersConfig {
            gemini_api_key: SecretString::from("super-secret".to_string()),
            ..Default::default()
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(config.gemini_api_key.expose_secret() == "super-secret");
    }
}
