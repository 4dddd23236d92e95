use std::convert::Infallible;
use std::sync::Arc;

use axum::Json;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use futures_util::{StreamExt, stream};
use lightchat_core::{Message, SessionId};
use lightchat_service::{ServiceError, TurnEvent, TurnStream};

use crate::AppState;
use crate::api_error::ApiError;

fn parse_session(raw: &str) -> Result<SessionId, ApiError> {
    Ok(raw.parse::<SessionId>()?)
}

/// Pull the first event so that failures before any output become error responses.
async fn prime(mut events: TurnStream) -> Result<TurnStream, ServiceError> {
    match events.next().await {
        None => Ok(Box::pin(stream::empty::<Result<TurnEvent, ServiceError>>())),
        Some(Err(e)) => Err(e),
        Some(Ok(first)) => Ok(Box::pin(stream::once(async move { Ok(first) }).chain(events))),
    }
}

pub async fn create_session(State(state): State<Arc<AppState>>) -> String {
    state.chat.create_session().await.to_string()
}

pub async fn post_message(
    State(state): State<Arc<AppState>>,
    Path(session): Path<String>,
    body: String,
) -> Result<String, ApiError> {
    let id = parse_session(&session)?;
    Ok(state.chat.send_message(id, body).await?)
}

/// Streams a JSON array of answer increments, one element per increment.
pub async fn post_array(
    State(state): State<Arc<AppState>>,
    Path(session): Path<String>,
    body: String,
) -> Result<Response, ApiError> {
    let id = parse_session(&session)?;
    let mut events = prime(state.chat.stream_message(id, body).await?).await?;

    let chunks = async_stream::stream! {
        yield Ok::<_, ServiceError>("[".to_owned());
        let mut first = true;
        while let Some(event) = events.next().await {
            match event {
                Ok(event) => {
                    let element = serde_json::Value::from(event.text()).to_string();
                    yield Ok(if first { element } else { format!(",{element}") });
                    first = false;
                },
                Err(e) => {
                    // Leave the array unterminated: the client sees a broken body, not a short answer.
                    yield Err(e);
                    return;
                },
            }
        }
        yield Ok("]".to_owned());
    };

    Ok(([(header::CONTENT_TYPE, "application/json")], Body::from_stream(chunks)).into_response())
}

/// Escapes backslashes and line breaks so an event never spans lines.
fn single_line(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

fn frame(event: &TurnEvent) -> String {
    match event {
        TurnEvent::Reasoning(text) => format!("[thinking] {}\n\n", single_line(text)),
        TurnEvent::Content { text, .. } => format!("[content] {}\n\n", single_line(text)),
    }
}

/// Raw event stream: one `[thinking]` or `[content]` line per event, line
/// breaks inside the text escaped as `\n` and `\r`.
/// A mid-stream failure just ends the stream.
pub async fn post_sse(
    State(state): State<Arc<AppState>>,
    Path(session): Path<String>,
    body: String,
) -> Result<Response, ApiError> {
    let id = parse_session(&session)?;
    let mut events = prime(state.chat.stream_events(id, body).await?).await?;

    let frames = async_stream::stream! {
        while let Some(event) = events.next().await {
            match event {
                Ok(event) => yield Ok::<_, Infallible>(frame(&event)),
                Err(e) => {
                    tracing::warn!(session = %id, error = %e, "event stream ended early");
                    break;
                },
            }
        }
    };

    Ok((
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(frames),
    )
        .into_response())
}

pub async fn get_transcript(
    State(state): State<Arc<AppState>>,
    Path(session): Path<String>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let id = parse_session(&session)?;
    Ok(Json(state.chat.transcript(id).await?))
}
