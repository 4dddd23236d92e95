use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::StreamExt;
use lightchat_core::{
    Fragment, FragmentKind, LightTool, MAX_TOOL_ROUNDS, Message, Role, ToolError, Toolset,
};
use serde_json::{Value, json};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::client::{OllamaEngine, parse_line};
use crate::engine::{CompletionEngine, CompletionOptions, ToolChoice};
use crate::error::LlmError;

#[derive(Default)]
struct RecordingToolset {
    calls: Mutex<Vec<LightTool>>,
}

#[async_trait]
impl Toolset for RecordingToolset {
    async fn execute(&self, call: LightTool) -> Result<Value, ToolError> {
        self.calls.lock().unwrap().push(call);
        Ok(json!([{"id": 1, "name": "Lamp", "is_on": false, "temperature": null}]))
    }
}

fn ndjson(lines: &[Value]) -> String {
    lines.iter().map(|l| format!("{l}\n")).collect()
}

fn answer_line(content: &str) -> Value {
    json!({"message": {"role": "assistant", "content": content}, "done": false})
}

fn done_line() -> Value {
    json!({"message": {"role": "assistant", "content": ""}, "done": true})
}

async fn collect(
    engine: &OllamaEngine,
    toolset: Arc<dyn Toolset>,
    options: CompletionOptions,
) -> Vec<Result<Fragment, LlmError>> {
    engine.complete(vec![Message::user("hi")], toolset, options).collect().await
}

#[tokio::test]
async fn test_streams_reasoning_then_answer() {
    let server = MockServer::start().await;
    let body = ndjson(&[
        json!({"message": {"role": "assistant", "content": "", "thinking": "pondering"}, "done": false}),
        answer_line("Hel"),
        answer_line("lo"),
        done_line(),
    ]);
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_string_contains(r#""stream":true"#))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(&server)
        .await;

    let engine = OllamaEngine::new(&server.uri(), "test-model").unwrap();
    let fragments: Vec<Fragment> =
        collect(&engine, Arc::new(RecordingToolset::default()), CompletionOptions::default())
            .await
            .into_iter()
            .map(Result::unwrap)
            .collect();

    assert_eq!(
        fragments,
        vec![
            Fragment::reasoning("pondering"),
            Fragment::answer(Role::Assistant, "Hel"),
            Fragment::answer(Role::Assistant, "lo"),
        ]
    );
}

#[tokio::test]
async fn test_http_error_status_surfaces_as_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let engine = OllamaEngine::new(&server.uri(), "test-model").unwrap();
    let items =
        collect(&engine, Arc::new(RecordingToolset::default()), CompletionOptions::default()).await;

    assert_eq!(items.len(), 1);
    match &items[0] {
        Err(err @ LlmError::HttpStatus { code: 503, body }) => {
            assert_eq!(body, "overloaded");
            assert!(err.is_transient());
        },
        other => panic!("expected HttpStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn test_error_line_becomes_upstream_error() {
    let server = MockServer::start().await;
    let body = ndjson(&[answer_line("partial"), json!({"error": "model not found"})]);
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let engine = OllamaEngine::new(&server.uri(), "test-model").unwrap();
    let items =
        collect(&engine, Arc::new(RecordingToolset::default()), CompletionOptions::default()).await;

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_ref().unwrap().text, "partial");
    assert!(matches!(&items[1], Err(LlmError::Upstream(msg)) if msg == "model not found"));
}

#[tokio::test]
async fn test_tool_call_round_is_executed_and_hidden() {
    let server = MockServer::start().await;
    // Second round: the request now carries the tool result.
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_string_contains(r#""role":"tool""#))
        .and(body_string_contains(r#""tool_name":"get_lights""#))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(ndjson(&[answer_line("You have one lamp."), done_line()])),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_string_contains(r#""name":"get_lights""#))
        .respond_with(ResponseTemplate::new(200).set_body_string(ndjson(&[
            json!({
                "message": {
                    "role": "assistant",
                    "content": "",
                    "tool_calls": [{"function": {"name": "get_lights", "arguments": {}}}]
                },
                "done": false
            }),
            done_line(),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let toolset = Arc::new(RecordingToolset::default());
    let engine = OllamaEngine::new(&server.uri(), "test-model").unwrap();
    let fragments: Vec<Fragment> =
        collect(&engine, Arc::clone(&toolset) as Arc<dyn Toolset>, CompletionOptions::default())
            .await
            .into_iter()
            .map(Result::unwrap)
            .collect();

    assert_eq!(fragments, vec![Fragment::answer(Role::Assistant, "You have one lamp.")]);
    assert_eq!(*toolset.calls.lock().unwrap(), vec![LightTool::GetLights {}]);
}

#[tokio::test]
async fn test_unknown_tool_is_reported_back_to_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_string_contains(r#""role":"tool""#))
        .and(body_string_contains("unknown tool"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(ndjson(&[answer_line("Sorry."), done_line()])),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ndjson(&[
            json!({
                "message": {
                    "role": "assistant",
                    "content": "",
                    "tool_calls": [{"function": {"name": "open_door", "arguments": {}}}]
                },
                "done": true
            }),
        ])))
        .mount(&server)
        .await;

    let toolset = Arc::new(RecordingToolset::default());
    let engine = OllamaEngine::new(&server.uri(), "test-model").unwrap();
    let items =
        collect(&engine, Arc::clone(&toolset) as Arc<dyn Toolset>, CompletionOptions::default())
            .await;

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].as_ref().unwrap().text, "Sorry.");
    assert!(toolset.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_endless_tool_calls_are_cut_off() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ndjson(&[json!({
            "message": {
                "role": "assistant",
                "content": "",
                "tool_calls": [{"function": {"name": "get_lights", "arguments": {}}}]
            },
            "done": true
        })])))
        .mount(&server)
        .await;

    let toolset = Arc::new(RecordingToolset::default());
    let engine = OllamaEngine::new(&server.uri(), "test-model").unwrap();
    let items =
        collect(&engine, Arc::clone(&toolset) as Arc<dyn Toolset>, CompletionOptions::default())
            .await;

    assert!(matches!(items.last(), Some(Err(LlmError::ToolLoopExceeded(n))) if *n == MAX_TOOL_ROUNDS));
    assert_eq!(toolset.calls.lock().unwrap().len(), MAX_TOOL_ROUNDS);
}

#[tokio::test]
async fn test_tool_choice_none_omits_tool_definitions() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_string_contains(r#""tools""#))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(ndjson(&[answer_line("ok"), done_line()])),
        )
        .mount(&server)
        .await;

    let engine = OllamaEngine::new(&server.uri(), "test-model").unwrap();
    let options = CompletionOptions { tool_choice: ToolChoice::None, think: None };
    let items = collect(&engine, Arc::new(RecordingToolset::default()), options).await;

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].as_ref().unwrap().kind, FragmentKind::Final);
}

#[test]
fn test_parse_line_skips_blank_lines() {
    assert!(parse_line(b"").unwrap().is_none());
    assert!(parse_line(b"  \r\n").unwrap().is_none());
}

#[test]
fn test_parse_line_rejects_garbage() {
    assert!(matches!(parse_line(b"{not json"), Err(LlmError::JsonParse { .. })));
}

#[test]
fn test_parse_line_reads_done_marker() {
    let chunk = parse_line(br#"{"message":{"role":"assistant","content":""},"done":true}"#)
        .unwrap()
        .unwrap();
    assert!(chunk.done);
    assert!(chunk.error.is_none());
}
