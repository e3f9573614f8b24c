mod harness;

use std::time::Duration;

use axum::http::StatusCode;
use harness::Reply;
use harness::mock_ollama::{MockOllama, chat_response};
use schemars::JsonSchema;
use serde_json::json;
use switchboard_llm::{
    ChatMessage, ChatParams, ChatResponse, ChatRole, Client, FinishReason, LlmError, ResponseFormat, ToolDefinition,
};

fn client(mock: &MockOllama) -> Client {
    Client::builder("ollama", "llama3")
        .with_endpoint(mock.endpoint())
        .build()
        .unwrap()
}

async fn complete(client: &Client, params: ChatParams) -> Result<ChatResponse, LlmError> {
    let reply = client.chat(params).await?;
    Ok(reply.into_complete().expect("non-streaming call returns one response"))
}

#[tokio::test]
async fn chat_returns_canonical_response() {
    let mock = MockOllama::start().await.unwrap();
    let client = client(&mock);

    let response = complete(&client, ChatParams::new(["Why is the sky blue?"])).await.unwrap();

    let message = response.message.unwrap();
    assert_eq!(message.role, ChatRole::Assistant);
    assert_eq!(message.content, "Hello from mock Ollama");
    assert_eq!(response.model.as_deref(), Some("llama3"));
    assert_eq!(response.finish_reason, Some(FinishReason::Stop));
    assert!(response.tool_calls.is_none());

    let usage = response.usage.unwrap();
    assert_eq!(usage.prompt_tokens, Some(26));
    assert_eq!(usage.completion_tokens, Some(12));
    assert_eq!(usage.total_tokens, Some(38));
}

#[tokio::test]
async fn minimal_request_omits_optional_fields() {
    let mock = MockOllama::start().await.unwrap();
    let client = client(&mock);

    complete(&client, ChatParams::new(["hi"])).await.unwrap();

    let body = mock.last_body();
    assert_eq!(body["model"], "llama3");
    assert_eq!(body["stream"], false);
    assert_eq!(body["messages"], json!([{"role": "user", "content": "hi"}]));
    assert!(body.get("options").is_none(), "empty options must be omitted: {body}");
    assert!(body.get("tools").is_none());
    assert!(body.get("format").is_none());
}

#[tokio::test]
async fn recognized_options_are_nested_and_unknown_ones_dropped() {
    let mock = MockOllama::start().await.unwrap();
    let client = client(&mock);

    let params = ChatParams::new([
        ChatMessage::system("Answer briefly"),
        ChatMessage::user("hello"),
    ])
    .with_option("temperature", 0.2)
    .with_option("num_ctx", 4096)
    .with_option("not_an_option", "ignored");

    complete(&client, params).await.unwrap();

    let body = mock.last_body();
    assert_eq!(body["options"], json!({"temperature": 0.2, "num_ctx": 4096}));
    assert!(body.get("not_an_option").is_none());
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["content"], "hello");
}

#[tokio::test]
async fn per_call_model_overrides_client_model() {
    let mock = MockOllama::start().await.unwrap();
    let client = client(&mock);

    complete(&client, ChatParams::new(["hi"]).with_model("qwen2:7b")).await.unwrap();

    assert_eq!(mock.last_body()["model"], "qwen2:7b");
}

#[derive(JsonSchema)]
#[allow(dead_code)]
struct Forecast {
    city: String,
    celsius: f64,
}

#[tokio::test]
async fn structured_output_sends_schema_as_format() {
    let mock = MockOllama::start_with(Reply::Json(chat_response(r#"{"city":"Oslo","celsius":4.5}"#, "stop")))
        .await
        .unwrap();
    let client = client(&mock);

    let response = complete(
        &client,
        ChatParams::new(["Weather in Oslo?"]).with_response_format(ResponseFormat::for_type::<Forecast>()),
    )
    .await
    .unwrap();

    let body = mock.last_body();
    assert_eq!(body["format"]["type"], "object");
    assert!(body["format"]["properties"]["celsius"].is_object());

    let parsed: serde_json::Value = serde_json::from_str(response.text()).unwrap();
    assert_eq!(parsed["city"], "Oslo");
}

#[tokio::test]
async fn tool_calls_are_decoded() {
    let mock = MockOllama::start_with(Reply::Json(json!({
        "model": "llama3",
        "message": {
            "role": "assistant",
            "content": "",
            "tool_calls": [
                {"function": {"name": "get_weather", "arguments": {"city": "Paris"}}},
                {"function": {"name": "get_time", "arguments": "{\"tz\":\"CET\"}"}},
            ],
        },
        "done": true,
        "done_reason": "stop",
    })))
    .await
    .unwrap();
    let client = client(&mock);

    let tools = vec![ToolDefinition::function(
        "get_weather",
        "Current weather for a city",
        json!({"type": "object", "properties": {"city": {"type": "string"}}}),
    )];
    let response = complete(&client, ChatParams::new(["Weather in Paris?"]).with_tools(tools))
        .await
        .unwrap();

    assert_eq!(mock.last_body()["tools"][0]["function"]["name"], "get_weather");

    let calls = response.tool_calls.unwrap();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].function.name, "get_weather");
    assert_eq!(calls[0].function.arguments["city"], "Paris");
    assert_eq!(calls[1].function.arguments["tz"], "CET");
    assert!(response.usage.is_none());
}

#[tokio::test]
async fn undecodable_tool_arguments_fail_the_call() {
    let mock = MockOllama::start_with(Reply::Json(json!({
        "model": "llama3",
        "message": {
            "role": "assistant",
            "content": "",
            "tool_calls": [{"function": {"name": "get_weather", "arguments": "{not json"}}],
        },
        "done": true,
    })))
    .await
    .unwrap();
    let client = client(&mock);

    let err = complete(&client, ChatParams::new(["hi"])).await.unwrap_err();
    assert!(
        matches!(&err, LlmError::InvalidToolArguments { function, .. } if function == "get_weather"),
        "got {err:?}"
    );
}

#[tokio::test]
async fn error_status_carries_status_and_body() {
    let mock = MockOllama::start_with(Reply::Status(
        StatusCode::NOT_FOUND,
        r#"{"error":"model 'nope' not found"}"#.to_owned(),
    ))
    .await
    .unwrap();
    let client = client(&mock);

    let err = complete(&client, ChatParams::new(["hi"])).await.unwrap_err();
    match &err {
        LlmError::BackendRequest { backend, status, cause } => {
            assert_eq!(backend, "ollama");
            assert_eq!(*status, Some(404));
            assert!(cause.contains("not found"), "cause: {cause}");
        }
        other => panic!("expected BackendRequest, got {other:?}"),
    }
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn server_error_is_retryable() {
    let mock = MockOllama::start_with(Reply::Status(StatusCode::SERVICE_UNAVAILABLE, String::new()))
        .await
        .unwrap();
    let client = client(&mock);

    let err = complete(&client, ChatParams::new(["hi"])).await.unwrap_err();
    assert!(matches!(err, LlmError::BackendRequest { status: Some(503), .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn slow_backend_times_out() {
    let mock = MockOllama::start_with(Reply::Delayed(
        Duration::from_secs(5),
        chat_response("too late", "stop"),
    ))
    .await
    .unwrap();
    let client = Client::builder("ollama", "llama3")
        .with_endpoint(mock.endpoint())
        .with_timeout(Duration::from_millis(200))
        .build()
        .unwrap();

    let err = complete(&client, ChatParams::new(["hi"])).await.unwrap_err();
    assert!(
        matches!(&err, LlmError::BackendTimeout { timeout, .. } if *timeout == Duration::from_millis(200)),
        "got {err:?}"
    );
    assert!(err.is_retryable());
}

#[tokio::test]
async fn unknown_reply_role_is_malformed() {
    let mock = MockOllama::start_with(Reply::Json(json!({
        "model": "llama3",
        "message": {"role": "narrator", "content": "Once upon a time"},
        "done": true,
    })))
    .await
    .unwrap();
    let client = client(&mock);

    let err = complete(&client, ChatParams::new(["hi"])).await.unwrap_err();
    assert!(matches!(err, LlmError::MalformedResponse { .. }), "got {err:?}");
}

#[tokio::test]
async fn invalid_messages_fail_before_any_request() {
    let mock = MockOllama::start().await.unwrap();
    let client = client(&mock);

    let err = client
        .chat(ChatParams::new([json!("ok"), json!(42)]))
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::InvalidMessageType { index: 1, .. }), "got {err:?}");
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn models_lists_installed_tags() {
    let mock = MockOllama::start().await.unwrap();
    let client = client(&mock);

    let models = client.models().await.unwrap();
    assert_eq!(models, vec!["llama3:latest", "qwen2:7b"]);
}

#[tokio::test]
async fn models_empty_when_nothing_installed() {
    let mock = MockOllama::start_with_models(Reply::Json(chat_response("", "stop")), json!({"models": []}))
        .await
        .unwrap();
    let client = client(&mock);

    assert!(client.models().await.unwrap().is_empty());
}
