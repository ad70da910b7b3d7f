//! Streaming integration tests

use crate::fixtures::*;
use crate::helpers::*;
use crate::mock_gateway::*;
use futures::StreamExt;
use gateway_sdk::InvokeMode;
use pretty_assertions::assert_eq;

/// Test OpenAI deltas arrive in order
#[tokio::test]
async fn test_openai_stream() {
    let gateway = MockGateway::start().await;
    gateway.mock_openai_stream(&["Once", " upon", " a time"]).await;

    let model = fallback_for(&gateway, vec![openai_candidate()], None);
    let stream = model.stream_text(&simple_prompt()).await.unwrap();
    let chunks: Vec<String> = stream.map(|c| c.unwrap()).collect().await;

    assert_eq!(chunks, vec!["Once", " upon", " a time"]);

    let bodies = gateway.bodies().await;
    assert_eq!(bodies[0]["query"]["stream"], true);
}

/// Test a stream served by the fallback candidate
#[tokio::test]
async fn test_stream_after_fallback() {
    let gateway = MockGateway::start().await;
    gateway.mock_always_status("openai", 503).await;
    gateway.mock_anthropic_stream(&["Hel", "lo"]).await;

    let model = fallback_for(
        &gateway,
        vec![openai_candidate(), anthropic_candidate()],
        None,
    );
    let response = model
        .dispatch(&prompt_with_system("Be brief", "Greet me"), InvokeMode::Stream)
        .await
        .unwrap();

    assert_eq!(response.served_by.provider, "anthropic");
    assert_eq!(response.content.collect_text().await.unwrap(), "Hello");

    let bodies = gateway.bodies().await;
    assert_eq!(bodies[1]["query"]["system"], "Be brief");
}

/// Test a buffered reply to a streaming request yields a single chunk
#[tokio::test]
async fn test_buffered_reply_to_stream_request() {
    let gateway = MockGateway::start().await;
    gateway.mock_openai_completion("cached answer").await;

    let model = fallback_for(&gateway, vec![openai_candidate()], None);
    let stream = model.stream_text(&simple_prompt()).await.unwrap();
    let chunks: Vec<String> = stream.map(|c| c.unwrap()).collect().await;

    assert_eq!(chunks, vec!["cached answer"]);
}

/// Test the chat builder can stream
#[tokio::test]
async fn test_chat_builder_stream() {
    let gateway = MockGateway::start().await;
    gateway.mock_anthropic_stream(&["a", "b", "c"]).await;

    let model = fallback_for(&gateway, vec![anthropic_candidate()], None);
    let response = model
        .chat()
        .user_message("Spell it")
        .max_tokens(8)
        .stream()
        .await
        .unwrap();

    assert_eq!(response.content.collect_text().await.unwrap(), "abc");
    assert_eq!(gateway.bodies().await[0]["query"]["max_tokens"], 8);
}
