//! HTTP handlers and the mapping of routing outcomes to JSON bodies.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use modelrelay_core::error::{RelayError, MSG_NOT_AVAILABLE};
use modelrelay_core::types::{ChatRequest, CodeRequest, Routed, MOCK_MODEL};
use modelrelay_core::utils::timestamp;

use crate::server::GatewayState;

/// Model reported on failure bodies.
const ERROR_MODEL: &str = "error";

/// `/code-generate` body when nothing can serve the request.
const NO_MODEL_CODE: &str = "# No model available to generate code";

/// Successful `/chat` body.
#[derive(Debug, Serialize)]
struct ChatReply {
    response: String,
    model: String,
}

/// Successful `/code-generate` body.
#[derive(Debug, Serialize)]
struct CodeReply {
    code: String,
    model: String,
}

// ── Informational ──

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "API is running" }))
}

pub async fn health(State(state): State<GatewayState>) -> Json<Value> {
    let providers: Map<String, Value> = state
        .router
        .registry()
        .status()
        .into_iter()
        .map(|s| {
            (
                s.id.to_string(),
                json!({
                    "name": s.name,
                    "configured": s.configured,
                    "simulated": s.simulated,
                    "available": s.available,
                }),
            )
        })
        .collect();

    Json(json!({
        "status": "online",
        "message": "Modelrelay is running",
        "timestamp": timestamp(),
        "uptime_secs": state.start_time.elapsed().as_secs(),
        "providers": providers,
    }))
}

pub async fn models(State(state): State<GatewayState>) -> Json<Value> {
    let models = state.router.registry().list_available_models();
    Json(json!({ "models": models }))
}

pub async fn verify_key(State(state): State<GatewayState>) -> Json<Value> {
    let ids: Vec<String> = state
        .router
        .registry()
        .list_available_models()
        .into_iter()
        .map(|m| m.id)
        .collect();
    Json(json!({ "status": "OK", "available_models": ids }))
}

// ── Toggles ──

/// `POST /toggle/{provider}`.
pub async fn toggle(State(state): State<GatewayState>, Path(provider): Path<String>) -> Response {
    toggle_named(State(state), provider).await
}

/// Flip a provider's simulated-down flag. Used by the fixed `/toggle-<name>`
/// routes and the generic path form.
pub async fn toggle_named(State(state): State<GatewayState>, provider: impl AsRef<str>) -> Response {
    let provider = provider.as_ref();
    let registry = state.router.registry();
    match registry.toggle_down(provider) {
        Ok(simulated) => {
            let name = registry
                .get(provider)
                .map(|e| e.spec().display_name)
                .unwrap_or(provider);
            Json(json!({ "status": format!("{name} simulation is now {simulated}") }))
                .into_response()
        }
        Err(e) => {
            warn!(provider = %provider, "Toggle for unknown provider");
            error_body(&e)
        }
    }
}

// ── Routing ──

pub async fn chat(
    State(state): State<GatewayState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return reject_body(rejection),
    };
    debug!(model = ?request.model, chars = request.content.len(), "Chat request");
    let outcome = state.router.route_chat(request).await;
    render_chat(outcome)
}

pub async fn code_generate(
    State(state): State<GatewayState>,
    payload: Result<Json<CodeRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return reject_body(rejection),
    };
    debug!(
        model = ?request.model,
        language = ?request.language,
        "Code generation request"
    );
    let outcome = state.router.route_code(request).await;
    render_code(outcome)
}

fn render_chat(outcome: Result<Routed, RelayError>) -> Response {
    match outcome {
        Ok(routed) => {
            info!(provider = %routed.provider, model = %routed.model, "Chat served");
            Json(ChatReply {
                response: routed.text,
                model: routed.model,
            })
            .into_response()
        }
        Err(e @ RelayError::Validation { .. }) => error_body(&e),
        Err(e) if e.is_unavailable() => (
            e.status_code(),
            Json(json!({ "response": MSG_NOT_AVAILABLE, "model": MOCK_MODEL })),
        )
            .into_response(),
        Err(e) => (
            e.status_code(),
            Json(json!({
                "response": e.user_message(),
                "error": e.to_string(),
                "model": ERROR_MODEL,
            })),
        )
            .into_response(),
    }
}

fn render_code(outcome: Result<Routed, RelayError>) -> Response {
    match outcome {
        Ok(routed) => {
            info!(provider = %routed.provider, model = %routed.model, "Code served");
            Json(CodeReply {
                code: routed.text,
                model: routed.model,
            })
            .into_response()
        }
        Err(e @ RelayError::Validation { .. }) => error_body(&e),
        Err(e) if e.is_unavailable() => (
            e.status_code(),
            Json(json!({ "code": NO_MODEL_CODE, "model": MOCK_MODEL })),
        )
            .into_response(),
        Err(e) => {
            let detail = e.to_string();
            (
                e.status_code(),
                Json(json!({
                    "code": format!("# Error: {detail}"),
                    "error": detail,
                    "model": ERROR_MODEL,
                })),
            )
                .into_response()
        }
    }
}

/// `{error: <user message>}` with the error's status.
fn error_body(e: &RelayError) -> Response {
    let status: StatusCode = e.status_code();
    (status, Json(json!({ "error": e.user_message() }))).into_response()
}

/// Unreadable bodies keep axum's status but get the `{error}` shape.
fn reject_body(rejection: JsonRejection) -> Response {
    let detail = rejection.body_text();
    warn!(error = %detail, "Rejected request body");
    (rejection.status(), Json(json!({ "error": detail }))).into_response()
}
