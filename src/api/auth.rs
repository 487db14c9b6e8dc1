use std::sync::Arc;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use crate::api::AppState;
use crate::types::ids::ApiKey;

pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Lets a request through only if `X-Api-Key` names a registered key.
///
/// The parsed `ApiKey` is stored in the request extensions for the handler.
pub async fn require_registered_key(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let key = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(|raw| ApiKey::from_string(raw.trim()).ok());

    let key = match key {
        Some(key) if state.engine.registry().contains(&key) => key,
        _ => {
            tracing::debug!("Rejected use request without a registered API key");
            return (
                StatusCode::UNAUTHORIZED,
                "Please register an API key before attempting to use it.",
            )
                .into_response();
        }
    };

    request.extensions_mut().insert(key);

    next.run(request).await
}
