//! Completion engine contract consumed by the chat orchestrator.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;

use futures_util::Stream;
use lightchat_core::{Fragment, Message, Toolset};
use serde::Serialize;

use crate::error::LlmError;

/// Lazily driven fragment producer. Nothing is sent upstream until first poll;
/// dropping it aborts the in-flight request.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<Fragment, LlmError>> + Send>>;

/// Whether the model may call tools on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolChoice {
    #[default]
    Auto,
    None,
}

/// Engine-specific reasoning effort hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThinkLevel {
    Low,
    Medium,
    High,
}

impl Display for ThinkLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        })
    }
}

impl FromStr for ThinkLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("invalid think level: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionOptions {
    pub tool_choice: ToolChoice,
    pub think: Option<ThinkLevel>,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self { tool_choice: ToolChoice::Auto, think: Some(ThinkLevel::Medium) }
    }
}

/// Black-box completion engine.
///
/// Tool calls requested by the model are executed against `toolset` inside the
/// stream; callers only ever see reasoning and answer fragments.
pub trait CompletionEngine: Send + Sync {
    fn complete(
        &self,
        transcript: Vec<Message>,
        toolset: Arc<dyn Toolset>,
        options: CompletionOptions,
    ) -> FragmentStream;
}
