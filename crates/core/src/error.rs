use thiserror::Error;

/// Errors raised while decoding a model-issued tool call.
#[derive(Error, Debug)]
pub enum ToolCallError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid arguments for {tool}: {source}")]
    InvalidArguments {
        tool: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Malformed session identifier supplied by a client.
#[derive(Error, Debug)]
#[error("invalid session id '{0}'")]
pub struct InvalidSessionId(pub String);
