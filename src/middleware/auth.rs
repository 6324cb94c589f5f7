//! Bearer-token actor extraction.
//!
//! §9 Open Question #1: the reference behavior treats the bearer value as
//! the raw user id with no signature verification. This is a known,
//! deliberate trust-boundary stub — an implementer deploying this for real
//! traffic MUST replace it with verification against the identity
//! provider's signing keys before it is internet-facing. It is kept literal
//! here because the rest of the system is written in terms of "the
//! authenticated actor" and does not need to change when the stub is
//! replaced.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::Error;
use crate::services::auth;
use crate::state::AppState;

fn bearer_user_id(request: &Request) -> Option<String> {
    let header = request.headers().get(axum::http::header::AUTHORIZATION)?;
    let value = header.to_str().ok()?;
    value.strip_prefix("Bearer ").map(|s| s.trim().to_string())
}

pub async fn actor_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Error> {
    let Some(user_id) = bearer_user_id(&request) else {
        return Err(Error::AuthFailure("missing Authorization bearer token".into()));
    };

    let user = auth::get_user(&state, &user_id)
        .await?
        .ok_or_else(|| Error::AuthFailure("unknown actor".into()))?;

    request.extensions_mut().insert(crate::models::users::Actor::from(&user));
    let response = next.run(request).await;
    Ok(response)
}

/// The actor extension type the handlers downstream pull via
/// `Extension<Actor>`, re-exported for convenience at the call sites.
pub type ActorExtension = axum::Extension<crate::models::users::Actor>;
