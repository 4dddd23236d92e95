use lightchat_core::Message;
use serde::{Deserialize, Serialize};

use crate::engine::ThinkLevel;

#[derive(Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub think: Option<ThinkLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<&'a [serde_json::Value]>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub(crate) struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing)]
    pub thinking: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

impl From<&Message> for ChatMessage {
    fn from(m: &Message) -> Self {
        Self { role: m.role.as_str().to_owned(), content: m.content.clone(), ..Self::default() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ToolCall {
    pub function: FunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

/// One NDJSON line of a streaming `/api/chat` response.
#[derive(Debug, Deserialize)]
pub(crate) struct ChatChunk {
    pub message: Option<ChatMessage>,
    #[serde(default)]
    pub done: bool,
    pub error: Option<String>,
}
