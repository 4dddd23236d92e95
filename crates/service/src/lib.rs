//! Service layer for lightchat
//!
//! Session transcripts, the light tools exposed to the model, and the
//! orchestrator that runs chat turns between HTTP handlers and the engine.

mod chat_service;
mod error;
mod lights_toolset;
mod session_store;

pub use chat_service::{ChatService, TurnEvent, TurnStream};
pub use error::ServiceError;
pub use lights_toolset::LightsToolset;
pub use session_store::{SessionConfig, SessionStore, TurnGuard, start_session_sweeper};
