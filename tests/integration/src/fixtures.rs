//! Test fixtures and sample data for integration tests

use gateway_sdk::{AnthropicMessages, CandidateModel, OpenAiChat, Prompt};
use serde_json::{json, Value};

/// Account id used by the mock gateway
pub const TEST_ACCOUNT: &str = "acct-test";
/// Gateway name used by the mock gateway
pub const TEST_GATEWAY: &str = "integration";
/// Gateway API key accepted by the mock gateway
pub const TEST_API_KEY: &str = "gw-test-key";

/// OpenAI model used throughout the tests
pub const OPENAI_MODEL: &str = "gpt-4o-mini";
/// Anthropic model used throughout the tests
pub const ANTHROPIC_MODEL: &str = "claude-3-5-haiku-latest";

/// A single-turn prompt
pub fn simple_prompt() -> Prompt {
    Prompt::user("Hello, how are you?")
}

/// A prompt with a system message
pub fn prompt_with_system(system: &str, user: &str) -> Prompt {
    Prompt::new().system_message(system).user_message(user)
}

/// A multi-turn conversation
pub fn multi_turn_prompt() -> Prompt {
    Prompt::new()
        .user_message("What is 2 + 2?")
        .assistant_message("2 + 2 equals 4.")
        .user_message("And what is that multiplied by 3?")
}

/// OpenAI candidate
pub fn openai_candidate() -> CandidateModel {
    CandidateModel::new(OpenAiChat::new(OPENAI_MODEL))
}

/// Anthropic candidate
pub fn anthropic_candidate() -> CandidateModel {
    CandidateModel::new(AnthropicMessages::new(ANTHROPIC_MODEL))
}

/// Create a sample OpenAI-format JSON response
pub fn openai_json_response(model: &str, content: &str) -> Value {
    json!({
        "id": "chatcmpl-test123",
        "object": "chat.completion",
        "created": 1698959748,
        "model": model,
        "choices": [
            {
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": content
                },
                "finish_reason": "stop"
            }
        ],
        "usage": {
            "prompt_tokens": 10,
            "completion_tokens": 20,
            "total_tokens": 30
        }
    })
}

/// Create a sample OpenAI streaming chunk
pub fn openai_streaming_chunk(model: &str, content: &str, is_done: bool) -> Value {
    let (delta, finish_reason) = if is_done {
        (json!({}), json!("stop"))
    } else {
        (json!({ "content": content }), Value::Null)
    };
    json!({
        "id": "chatcmpl-test123",
        "object": "chat.completion.chunk",
        "created": 1698959748,
        "model": model,
        "choices": [
            {
                "index": 0,
                "delta": delta,
                "finish_reason": finish_reason
            }
        ]
    })
}

/// SSE body for an OpenAI stream yielding `chunks`
pub fn openai_sse_body(model: &str, chunks: &[&str]) -> String {
    let mut body = format!(
        "data: {}\n\n",
        json!({"choices": [{"index": 0, "delta": {"role": "assistant"}}]})
    );
    for chunk in chunks {
        body.push_str(&format!("data: {}\n\n", openai_streaming_chunk(model, chunk, false)));
    }
    body.push_str(&format!("data: {}\n\n", openai_streaming_chunk(model, "", true)));
    body.push_str("data: [DONE]\n\n");
    body
}

/// Create a sample Anthropic-format JSON response
pub fn anthropic_json_response(model: &str, content: &str) -> Value {
    json!({
        "id": "msg_test123",
        "type": "message",
        "role": "assistant",
        "content": [
            {
                "type": "text",
                "text": content
            }
        ],
        "model": model,
        "stop_reason": "end_turn",
        "usage": {
            "input_tokens": 15,
            "output_tokens": 12
        }
    })
}

/// SSE body for an Anthropic stream yielding `chunks`
pub fn anthropic_sse_body(chunks: &[&str]) -> String {
    let mut body = String::from(
        "event: message_start\ndata: {\"type\":\"message_start\",\"message\":{\"id\":\"msg_test123\"}}\n\n",
    );
    body.push_str("event: ping\ndata: {\"type\":\"ping\"}\n\n");
    for chunk in chunks {
        body.push_str(&format!(
            "event: content_block_delta\ndata: {}\n\n",
            json!({"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": chunk}})
        ));
    }
    body.push_str("event: message_stop\ndata: {\"type\":\"message_stop\"}\n\n");
    body
}

/// Gateway error body carrying one gateway error code
pub fn gateway_error_body(code: u32, message: &str) -> Value {
    json!({
        "success": false,
        "error": [
            {
                "code": code,
                "message": message
            }
        ]
    })
}

/// Provider error body as relayed by the gateway
pub fn provider_error_body(error_type: &str, message: &str) -> Value {
    json!({
        "error": {
            "message": message,
            "type": error_type
        }
    })
}
