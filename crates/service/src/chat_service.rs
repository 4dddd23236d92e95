use std::pin::Pin;
use std::sync::Arc;

use futures_util::{Stream, StreamExt};
use lightchat_core::{Fragment, FragmentKind, Message, Role, SessionId, Toolset};
use lightchat_llm::{CompletionEngine, CompletionOptions, FragmentStream, ToolChoice};

use crate::error::ServiceError;
use crate::session_store::{SessionStore, TurnGuard};

/// A classified piece of a turn, as delivered to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnEvent {
    /// Thinking output. Shown live, never stored.
    Reasoning(String),
    /// Answer text, already appended to the transcript under `role`.
    Content { role: Role, text: String },
}

impl TurnEvent {
    pub fn text(&self) -> &str {
        match self {
            Self::Reasoning(text) | Self::Content { text, .. } => text,
        }
    }
}

pub type TurnStream = Pin<Box<dyn Stream<Item = Result<TurnEvent, ServiceError>> + Send>>;

/// Heartbeats vanish, reasoning stays reasoning, everything else is content.
fn classify(fragment: Fragment) -> Option<TurnEvent> {
    if fragment.is_heartbeat() {
        return None;
    }
    Some(match fragment.kind {
        FragmentKind::Reasoning => TurnEvent::Reasoning(fragment.text),
        FragmentKind::Final => TurnEvent::Content {
            role: fragment.role.unwrap_or(Role::Assistant),
            text: fragment.text,
        },
    })
}

/// Drives one engine turn per user message and keeps the transcript in step.
pub struct ChatService {
    sessions: Arc<SessionStore>,
    engine: Arc<dyn CompletionEngine>,
    toolset: Arc<dyn Toolset>,
    options: CompletionOptions,
}

impl ChatService {
    #[must_use]
    pub fn new(
        sessions: Arc<SessionStore>,
        engine: Arc<dyn CompletionEngine>,
        toolset: Arc<dyn Toolset>,
        options: CompletionOptions,
    ) -> Self {
        // Every turn lets the model pick tools itself.
        let options = CompletionOptions { tool_choice: ToolChoice::Auto, ..options };
        Self { sessions, engine, toolset, options }
    }

    pub async fn create_session(&self) -> SessionId {
        self.sessions.create_session().await
    }

    pub async fn transcript(&self, id: SessionId) -> Result<Vec<Message>, ServiceError> {
        self.sessions.get_transcript(id).await
    }

    /// Claim the session, record the user message, and hand the transcript to the engine.
    async fn start_turn(
        &self,
        id: SessionId,
        text: String,
    ) -> Result<(TurnGuard, FragmentStream), ServiceError> {
        let guard = self.sessions.begin_turn(id).await?;
        self.sessions.append_user_message(id, text).await?;
        let transcript = self.sessions.get_transcript(id).await?;
        tracing::info!(session = %id, messages = transcript.len(), "turn dispatched");
        let fragments = self.engine.complete(transcript, Arc::clone(&self.toolset), self.options);
        Ok((guard, fragments))
    }

    /// Run a whole turn and return the answer.
    ///
    /// The answer is appended once, after the engine finishes. A failed turn
    /// leaves only the user message behind.
    pub async fn send_message(
        &self,
        id: SessionId,
        text: impl Into<String>,
    ) -> Result<String, ServiceError> {
        let (guard, mut fragments) = self.start_turn(id, text.into()).await?;

        let mut answer_role = None;
        let mut answer = String::new();
        while let Some(fragment) = fragments.next().await {
            let fragment = fragment
                .inspect_err(|e| tracing::warn!(session = %id, error = %e, "turn failed"))?;
            if let Some(TurnEvent::Content { role, text }) = classify(fragment) {
                answer_role.get_or_insert(role);
                answer.push_str(&text);
            }
        }

        if let Some(role) = answer_role {
            self.sessions.append_message(id, role, answer.clone()).await?;
        }
        drop(guard);
        tracing::info!(session = %id, chars = answer.len(), "turn completed");
        Ok(answer)
    }

    /// Answer increments only, each appended to the transcript as it is yielded.
    pub async fn stream_message(
        &self,
        id: SessionId,
        text: impl Into<String>,
    ) -> Result<TurnStream, ServiceError> {
        let (guard, fragments) = self.start_turn(id, text.into()).await?;
        Ok(Box::pin(persisting_stream(Arc::clone(&self.sessions), id, guard, fragments, false)))
    }

    /// Reasoning and answer increments in emission order; only answers are stored.
    pub async fn stream_events(
        &self,
        id: SessionId,
        text: impl Into<String>,
    ) -> Result<TurnStream, ServiceError> {
        let (guard, fragments) = self.start_turn(id, text.into()).await?;
        Ok(Box::pin(persisting_stream(Arc::clone(&self.sessions), id, guard, fragments, true)))
    }
}

/// The turn guard lives inside the stream, so dropping the stream ends the turn.
fn persisting_stream(
    sessions: Arc<SessionStore>,
    id: SessionId,
    guard: TurnGuard,
    mut fragments: FragmentStream,
    with_reasoning: bool,
) -> impl Stream<Item = Result<TurnEvent, ServiceError>> + Send {
    async_stream::try_stream! {
        let _guard = guard;
        let mut forwarded = 0usize;
        while let Some(fragment) = fragments.next().await {
            let fragment = fragment
                .inspect_err(|e| tracing::warn!(session = %id, error = %e, "turn failed"))?;
            let Some(event) = classify(fragment) else { continue };
            match &event {
                TurnEvent::Content { role, text } => {
                    sessions.append_message(id, *role, text.clone()).await?;
                },
                TurnEvent::Reasoning(_) if !with_reasoning => continue,
                TurnEvent::Reasoning(_) => {},
            }
            forwarded += 1;
            yield event;
        }
        tracing::info!(session = %id, forwarded, "turn completed");
    }
}
