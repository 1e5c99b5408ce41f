use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::{Extensions, HeaderMap},
    response::Response,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

use crate::context::build_system_prompt;
use crate::error::AppError;
use crate::metrics::{CHAT_LATENCY, CHAT_REQUESTS, RATE_LIMITED, RATE_LIMIT_ENTRIES};
use crate::models::{ChatRequest, Role};
use crate::rate_limit::Decision;
use crate::state::AppState;

/// Best-effort caller address: first `x-forwarded-for` hop, then
/// `x-real-ip`, then the socket peer.
pub fn client_id(headers: &HeaderMap, extensions: &Extensions) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    header("x-forwarded-for")
        .or_else(|| header("x-real-ip"))
        .or_else(|| {
            extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    extensions: Extensions,
    body: Bytes,
) -> Result<Response, AppError> {
    CHAT_REQUESTS.inc();
    let start_time = Instant::now();

    let result = handle_chat(&state, &headers, &extensions, body).await;

    // every outcome counts, rejections included
    CHAT_LATENCY.observe(start_time.elapsed().as_secs_f64());

    result
}

async fn handle_chat(
    state: &AppState,
    headers: &HeaderMap,
    extensions: &Extensions,
    body: Bytes,
) -> Result<Response, AppError> {
    let client = client_id(headers, extensions);
    let decision = state.rate_limiter.check_and_consume(&client);
    RATE_LIMIT_ENTRIES.set(state.rate_limiter.len() as f64);

    if decision == Decision::Rejected {
        RATE_LIMITED.inc();
        debug!(%client, "chat request rate limited");
        return Err(AppError::RateLimited);
    }

    let request: ChatRequest =
        serde_json::from_slice(&body).map_err(|_| AppError::MalformedPayload)?;

    // the system turn is ours to write
    if request.messages.iter().any(|m| m.role == Role::System) {
        return Err(AppError::MalformedPayload);
    }

    if let Err(e) = state.completion.api_key() {
        error!(error = %e, "chat relay misconfigured");
        return Err(e);
    }

    let system_prompt = build_system_prompt(state.store.as_ref()).await;

    info!(%client, turns = request.messages.len(), "relaying chat");
    state
        .completion
        .relay(request.messages, system_prompt)
        .await
}
