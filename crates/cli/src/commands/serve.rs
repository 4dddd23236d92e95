use std::sync::Arc;

use anyhow::Result;
use lightchat_core::env_non_empty;
use lightchat_http::{AppState, create_router};
use lightchat_llm::{
    CompletionOptions, DEFAULT_BASE_URL, DEFAULT_MODEL, OllamaEngine, ThinkLevel, ToolChoice,
};
use lightchat_service::{
    ChatService, LightsToolset, SessionConfig, SessionStore, start_session_sweeper,
};
use lightchat_storage::DeviceRepository;

use crate::open_storage;

/// `LIGHTCHAT_THINK`: `low`, `medium` (default), `high`, or `off`.
fn think_level() -> Option<ThinkLevel> {
    let Some(raw) = env_non_empty("LIGHTCHAT_THINK") else {
        return Some(ThinkLevel::Medium);
    };
    if raw.eq_ignore_ascii_case("off") {
        return None;
    }
    match raw.parse() {
        Ok(level) => Some(level),
        Err(e) => {
            tracing::warn!(error = %e, "invalid LIGHTCHAT_THINK, using medium");
            Some(ThinkLevel::Medium)
        },
    }
}

pub(crate) async fn run(port: u16, host: String) -> Result<()> {
    let storage = Arc::new(open_storage().await?);
    tracing::info!(backend = storage.kind(), "light store ready");
    let toolset = Arc::new(LightsToolset::new(DeviceRepository::new(storage)));

    let base_url = env_non_empty("LIGHTCHAT_OLLAMA_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
    let model = env_non_empty("LIGHTCHAT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_owned());
    let engine = Arc::new(OllamaEngine::new(&base_url, model)?);
    let think = think_level();
    tracing::info!(base_url = engine.base_url(), model = engine.model(), ?think, "completion engine configured");

    let sessions = Arc::new(SessionStore::new(SessionConfig::from_env()));
    let policy = sessions.config();
    tracing::info!(ttl_secs = policy.ttl.as_secs(), max_sessions = policy.max_sessions, "session policy");
    start_session_sweeper(Arc::clone(&sessions));

    let chat = Arc::new(ChatService::new(
        sessions,
        engine,
        toolset,
        CompletionOptions { tool_choice: ToolChoice::Auto, think },
    ));
    let router = create_router(Arc::new(AppState::new(chat)));

    let addr = format!("{host}:{port}");
    tracing::info!("Starting HTTP server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
