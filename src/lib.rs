//! Server-side relays for the corporate website.
//!
//! * `POST /faq-chat` answers visitor questions by forwarding the
//!   conversation, plus a system prompt built from the site's current news,
//!   job postings and contact details, to a chat-completion service and
//!   streaming its server-sent events straight back.
//! * `POST /send-contact-email` stores contact-form submissions and notifies
//!   staff by email.
//!
//! Requests to `/faq-chat` are throttled per client by an in-memory fixed
//! window. The counters live in this process only, so several instances
//! each apply the limit on their own.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};

pub mod config;
pub mod context;
pub mod email;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod rate_limit;
pub mod relay;
pub mod state;
pub mod store;

use handlers::{chat_handler, contact_handler, health_handler, metrics_handler};
use state::AppState;

/// Public browser clients call these endpoints from any origin. Every
/// OPTIONS request is answered by the layer before reaching a handler.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/faq-chat", post(chat_handler))
        .route("/send-contact-email", post(contact_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(cors_layer())
        .with_state(state)
}
