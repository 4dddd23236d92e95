//! HTTP API server for lightchat.

pub mod api_error;
mod handlers;
mod response_types;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Json, Router};
use lightchat_service::ChatService;
use tower_http::cors::CorsLayer;

pub use response_types::VersionResponse;

/// Shared application state for all HTTP handlers.
pub struct AppState {
    /// Turn orchestrator; owns the session store.
    pub chat: Arc<ChatService>,
}

impl AppState {
    #[must_use]
    pub const fn new(chat: Arc<ChatService>) -> Self {
        Self { chat }
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/version", get(version))
        .route("/chat/session", post(handlers::chat::create_session))
        .route("/chat/{session}/message", post(handlers::chat::post_message))
        .route("/chat/{session}/array", post(handlers::chat::post_array))
        .route("/chat/{session}/sse", post(handlers::chat::post_sse))
        .route("/chat/{session}/transcript", get(handlers::chat::get_transcript))
        // The browser client is served from another origin.
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn version() -> Json<VersionResponse> {
    Json(VersionResponse { version: env!("CARGO_PKG_VERSION") })
}
