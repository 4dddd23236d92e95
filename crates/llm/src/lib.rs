//! Completion engine integration for lightchat
//!
//! Defines the engine contract the chat orchestrator drives and ships an
//! Ollama client that streams reasoning and answer fragments and runs the
//! model's tool calls in-stream.

mod ai_types;
mod client;
mod engine;
mod error;
#[cfg(test)]
mod engine_tests;

pub use client::{DEFAULT_BASE_URL, DEFAULT_MODEL, OllamaEngine, truncate};
pub use engine::{CompletionEngine, CompletionOptions, FragmentStream, ThinkLevel, ToolChoice};
pub use error::LlmError;
