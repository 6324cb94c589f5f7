pub mod access;
pub mod config;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod middleware;
pub mod models;
pub mod providers;
pub mod services;
pub mod state;
pub mod store;
pub mod validation;

use axum::http::{HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Initializes the global `tracing` subscriber from `RUST_LOG`
/// (`info` by default), matching the teacher's plain env-filter setup.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::exact(HeaderValue::from_static("*")))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
            axum::http::HeaderName::from_static("x-amz-date"),
            axum::http::HeaderName::from_static("x-api-key"),
            axum::http::HeaderName::from_static("x-amz-security-token"),
        ])
}

/// Routes that do not require an authenticated actor: account lifecycle,
/// the model registry, and the health check.
fn public_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/models", get(handlers::models::list_models))
        .route("/auth/signup", post(handlers::auth::signup))
        .route("/auth/confirm", post(handlers::auth::confirm))
        .route("/auth/signin", post(handlers::auth::signin))
        .route(
            "/files/upload",
            post(handlers::files::upload),
        )
        .route("/files", get(handlers::files::list))
        .route(
            "/files/{id}",
            get(handlers::files::get)
                .put(handlers::files::update_visibility)
                .delete(handlers::files::delete),
        )
        .route("/files/{id}/query", post(handlers::files::query_file))
        .route("/conversations", get(handlers::conversations::list))
        .route(
            "/conversations/{id}",
            get(handlers::conversations::get).delete(handlers::conversations::delete),
        )
        .with_state(state)
}

/// Routes whose actor is derived from the `Authorization: Bearer <userId>`
/// trust-boundary stub (§9 open question #1) rather than from request body
/// or query fields.
fn authenticated_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/auth/profile",
            get(handlers::auth::get_profile).put(handlers::auth::update_profile),
        )
        .route(
            "/admin/users",
            get(handlers::admin::list_users).post(handlers::admin::create_user),
        )
        .route("/chat", post(handlers::chat::chat))
        .route_layer(from_fn_with_state(state.clone(), middleware::auth::actor_middleware))
        .with_state(state)
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(public_router(state.clone()))
        .merge(authenticated_router(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors_layer())
}
