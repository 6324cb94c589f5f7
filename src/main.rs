use std::sync::Arc;

use rag_chat_gateway::config::Config;
use rag_chat_gateway::identity::cognito::CognitoIdentity;
use rag_chat_gateway::providers::bedrock::BedrockConverseProvider;
use rag_chat_gateway::providers::gemini::GeminiProvider;
use rag_chat_gateway::state::AppState;
use rag_chat_gateway::store::dynamo::DynamoStore;
use rag_chat_gateway::store::s3::S3BlobStore;
use secrecy::ExposeSecret;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    rag_chat_gateway::init_tracing();

    let config = Config::load()?;
    tracing::info!(config = %config, "loaded configuration");

    let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(config.providers.bedrock_region.clone()))
        .load()
        .await;

    let store = Arc::new(DynamoStore::new(
        aws_sdk_dynamodb::Client::new(&aws_config),
        config.storage.main_table.clone(),
    ));
    let blobs = Arc::new(S3BlobStore::new(
        aws_sdk_s3::Client::new(&aws_config),
        config.storage.files_bucket.clone(),
    ));
    let identity = Arc::new(CognitoIdentity::new(
        aws_sdk_cognitoidentityprovider::Client::new(&aws_config),
        config.identity.user_pool_id.clone(),
        config.identity.user_pool_client_id.clone(),
    ));
    let bedrock = Arc::new(BedrockConverseProvider::new(aws_sdk_bedrockruntime::Client::new(
        &aws_config,
    )));

    let http_client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(
            config.providers.request_timeout_seconds,
        ))
        .build()?;
    let gemini = Arc::new(GeminiProvider::new(
        http_client,
        config.providers.gemini_api_key.clone(),
    ));

    let state = AppState::new(store, blobs, identity, bedrock, gemini, Arc::new(config.clone()));

    let router = rag_chat_gateway::create_router(state);

    let listener = tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    tracing::info!(host = %config.server.host, port = config.server.port, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
