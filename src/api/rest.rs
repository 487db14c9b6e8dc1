use axum::{
    Extension, Router,
    body::Body,
    extract::{Json, State, rejection::JsonRejection},
    http::{HeaderValue, Request, StatusCode, header},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId as HeaderRequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use crate::api::AppState;
use crate::api::auth::require_registered_key;
use crate::api::validation::{RegisterRequest, validate};
use crate::observability::metrics;
use crate::quota::UseOutcome;
use crate::registry::RegistrationOutcome;
use crate::types::ids::{ApiKey, RequestId};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn create_router(state: Arc<AppState>) -> Router {
    let quota_routes = Router::new()
        .route("/use", get(use_quota).post(use_quota))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_registered_key));

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_text))
        .route("/register", post(register))
        .merge(quota_routes)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestIdV4))
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .headers()
                        .get(REQUEST_ID_HEADER)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("-");
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                        request_id = %request_id,
                    )
                }))
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
}

#[derive(Clone, Copy, Default)]
struct MakeRequestIdV4;

impl MakeRequestId for MakeRequestIdV4 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<HeaderRequestId> {
        HeaderValue::from_str(&RequestId::new().to_string())
            .ok()
            .map(HeaderRequestId::new)
    }
}

async fn health_check() -> &'static str {
    "OK"
}

async fn metrics_text() -> Response {
    match metrics::render() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to render metrics: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            tracing::info!("Malformed registration body: {}", rejection.body_text());
            return (StatusCode::BAD_REQUEST, format!("400: {}", rejection.body_text())).into_response();
        }
    };

    let registration = match validate(&req) {
        Ok(registration) => registration,
        Err(e) => return (StatusCode::BAD_REQUEST, format!("400: {}", e)).into_response(),
    };

    let outcome = state.engine.register(
        registration.key,
        registration.limit,
        registration.window,
        registration.force,
    );

    match outcome {
        Ok(RegistrationOutcome::Created) => {
            (StatusCode::OK, "API key was registered successfully.").into_response()
        }
        Ok(RegistrationOutcome::Overwritten) => {
            (StatusCode::OK, "API key registration overwritten.").into_response()
        }
        Ok(RegistrationOutcome::Conflict) => (
            StatusCode::CONFLICT,
            "Overwriting API Key is not permissible without the force flag.",
        )
            .into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, format!("400: {}", e)).into_response(),
    }
}

/// Body of a `/use` response, for both 200 and 429.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UseResponse {
    #[serde(rename = "usage-left")]
    pub usage_left: u32,
    #[serde(rename = "next-reset")]
    pub next_reset_ms: u64,
}

impl From<UseOutcome> for UseResponse {
    fn from(outcome: UseOutcome) -> Self {
        UseResponse {
            usage_left: outcome.usage_left(),
            next_reset_ms: outcome.ms_until_reset(),
        }
    }
}

async fn use_quota(
    State(state): State<Arc<AppState>>,
    Extension(key): Extension<ApiKey>,
) -> Response {
    let outcome = state.engine.check_and_record(&key, state.clock.now());

    match outcome {
        UseOutcome::Admitted { .. } => {
            (StatusCode::OK, Json(UseResponse::from(outcome))).into_response()
        }
        UseOutcome::Denied { .. } => {
            (StatusCode::TOO_MANY_REQUESTS, Json(UseResponse::from(outcome))).into_response()
        }
        UseOutcome::NotFound => {
            (StatusCode::NOT_FOUND, "404: API Key was not found.").into_response()
        }
    }
}
