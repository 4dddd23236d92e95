use std::sync::Arc;

use futures_util::{Stream, StreamExt};
use lightchat_core::{Fragment, LightTool, MAX_TOOL_ROUNDS, Message, Role, Toolset};
use serde_json::json;

use crate::ai_types::{ChatChunk, ChatMessage, ChatRequest, FunctionCall, ToolCall};
use crate::engine::{CompletionEngine, CompletionOptions, FragmentStream, ToolChoice};
use crate::error::LlmError;

/// Default Ollama endpoint.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
/// Default model to use.
pub const DEFAULT_MODEL: &str = "qwen3:8b";

/// Streaming client for an Ollama `/api/chat` endpoint.
pub struct OllamaEngine {
    pub(crate) client: reqwest::Client,
    pub(crate) base_url: String,
    pub(crate) model: String,
}

impl std::fmt::Debug for OllamaEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaEngine")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl OllamaEngine {
    /// Creates a new engine client for the given endpoint and model.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built (TLS backend failure).
    pub fn new(base_url: &str, model: impl Into<String>) -> Result<Self, LlmError> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        // No overall timeout: a streamed answer may legitimately run for minutes.
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| LlmError::ClientInit(e.to_string()))?;
        Ok(Self { client, base_url, model: model.into() })
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the model name.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

impl CompletionEngine for OllamaEngine {
    fn complete(
        &self,
        transcript: Vec<Message>,
        toolset: Arc<dyn Toolset>,
        options: CompletionOptions,
    ) -> FragmentStream {
        Box::pin(chat_stream(
            self.client.clone(),
            format!("{}/api/chat", self.base_url),
            self.model.clone(),
            transcript,
            toolset,
            options,
        ))
    }
}

/// Accumulated state of one model round.
#[derive(Default)]
struct Round {
    answer: String,
    tool_calls: Vec<ToolCall>,
    done: bool,
}

impl Round {
    /// Fold one streamed chunk in, returning the fragments it carries.
    fn absorb(&mut self, chunk: ChatChunk) -> Result<Vec<Fragment>, LlmError> {
        if let Some(error) = chunk.error {
            return Err(LlmError::Upstream(error));
        }
        self.done |= chunk.done;
        let Some(message) = chunk.message else {
            return Ok(Vec::new());
        };

        let mut fragments = Vec::with_capacity(2);
        if !message.thinking.is_empty() {
            fragments.push(Fragment::reasoning(message.thinking));
        }
        if !message.content.is_empty() {
            let role = message.role.parse().unwrap_or(Role::Assistant);
            self.answer.push_str(&message.content);
            fragments.push(Fragment::answer(role, message.content));
        }
        self.tool_calls.extend(message.tool_calls);
        Ok(fragments)
    }
}

/// Parse one NDJSON line; blank lines yield `None`.
pub(crate) fn parse_line(line: &[u8]) -> Result<Option<ChatChunk>, LlmError> {
    let text = String::from_utf8_lossy(line);
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(text).map(Some).map_err(|source| LlmError::JsonParse {
        context: format!("chat stream line: {}", truncate(text, 200)),
        source,
    })
}

async fn run_tool(toolset: &dyn Toolset, call: &FunctionCall) -> serde_json::Value {
    let tool = match LightTool::from_call(&call.name, &call.arguments) {
        Ok(tool) => tool,
        Err(e) => {
            tracing::warn!(tool = %call.name, error = %e, "rejected tool call");
            return json!({ "error": e.to_string() });
        },
    };
    tracing::info!(tool = %call.name, arguments = %call.arguments, "executing tool call");
    match toolset.execute(tool).await {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!(tool = %call.name, error = %e, "tool call failed");
            json!({ "error": e.to_string() })
        },
    }
}

fn chat_stream(
    client: reqwest::Client,
    url: String,
    model: String,
    transcript: Vec<Message>,
    toolset: Arc<dyn Toolset>,
    options: CompletionOptions,
) -> impl Stream<Item = Result<Fragment, LlmError>> + Send {
    async_stream::try_stream! {
        let tools = match options.tool_choice {
            ToolChoice::Auto => toolset.definitions(),
            ToolChoice::None => Vec::new(),
        };
        let mut messages: Vec<ChatMessage> = transcript.iter().map(ChatMessage::from).collect();
        let mut rounds = 0usize;

        loop {
            let request = ChatRequest {
                model: &model,
                messages: &messages,
                stream: true,
                think: options.think,
                tools: (!tools.is_empty()).then_some(tools.as_slice()),
            };
            tracing::debug!(%url, %model, messages = messages.len(), round = rounds, "chat request");
            let response = client.post(&url).json(&request).send().await?;

            let status = response.status();
            if !status.is_success() {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Could not read error body".to_owned());
                Err::<(), _>(LlmError::HttpStatus { code: status.as_u16(), body })?;
                break;
            }

            let mut body = Box::pin(response.bytes_stream());
            let mut pending: Vec<u8> = Vec::new();
            let mut round = Round::default();

            while !round.done {
                let Some(chunk) = body.next().await else { break };
                pending.extend_from_slice(&chunk?);
                while let Some(pos) = pending.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = pending.drain(..=pos).collect();
                    if let Some(chunk) = parse_line(&line)? {
                        for fragment in round.absorb(chunk)? {
                            yield fragment;
                        }
                    }
                }
            }
            if let Some(chunk) = parse_line(&pending)? {
                for fragment in round.absorb(chunk)? {
                    yield fragment;
                }
            }

            if round.tool_calls.is_empty() {
                break;
            }
            rounds += 1;
            if rounds > MAX_TOOL_ROUNDS {
                Err::<(), _>(LlmError::ToolLoopExceeded(MAX_TOOL_ROUNDS))?;
            }

            let calls = std::mem::take(&mut round.tool_calls);
            messages.push(ChatMessage {
                role: Role::Assistant.as_str().to_owned(),
                content: std::mem::take(&mut round.answer),
                tool_calls: calls.clone(),
                ..ChatMessage::default()
            });
            for call in &calls {
                let result = run_tool(toolset.as_ref(), &call.function).await;
                messages.push(ChatMessage {
                    role: Role::Tool.as_str().to_owned(),
                    content: result.to_string(),
                    tool_name: Some(call.function.name.clone()),
                    ..ChatMessage::default()
                });
            }
        }
    }
}

/// Truncates a string to the given maximum length at a char boundary.
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        s
    } else {
        let mut end = max_len;
        while end > 0 && !s.is_char_boundary(end) {
            end = end.saturating_sub(1);
        }
        s.get(..end).unwrap_or("")
    }
}
