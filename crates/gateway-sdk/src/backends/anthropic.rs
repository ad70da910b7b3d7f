//! Anthropic messages adapter.

use super::{malformed, malformed_event};
use gateway_core::{
    BackendModel, BackendRequest, GatewayError, GatewayResult, MessageRole, Prompt, ProviderTag,
    StreamEvent,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const ENDPOINT: &str = "v1/messages";
const API_VERSION: &str = "2023-06-01";

/// Anthropic messages model
#[derive(Debug, Clone)]
pub struct AnthropicMessages {
    tag: ProviderTag,
    model: String,
    default_max_tokens: u32,
}

impl AnthropicMessages {
    /// Token limit used when the prompt sets none; the API requires one
    pub const DEFAULT_MAX_TOKENS: u32 = 1024;

    /// Anthropic model by identifier (e.g. `claude-3-5-haiku-latest`)
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            tag: ProviderTag::ANTHROPIC,
            model: model.into(),
            default_max_tokens: Self::DEFAULT_MAX_TOKENS,
        }
    }

    /// Set the token limit used when the prompt sets none
    #[must_use]
    pub fn default_max_tokens(mut self, max_tokens: u32) -> Self {
        self.default_max_tokens = max_tokens;
        self
    }
}

impl BackendModel for AnthropicMessages {
    fn provider(&self) -> &ProviderTag {
        &self.tag
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    fn prepare(&self, prompt: &Prompt, streaming: bool) -> GatewayResult<BackendRequest> {
        let messages: Vec<MessageParam<'_>> = prompt
            .messages
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .map(|m| MessageParam {
                role: m.role,
                content: &m.content,
            })
            .collect();

        if messages.is_empty() {
            return Err(GatewayError::configuration(
                "anthropic prompt needs at least one user or assistant message",
            ));
        }

        let request = MessagesRequest {
            model: &self.model,
            max_tokens: prompt.max_tokens.unwrap_or(self.default_max_tokens),
            system: prompt.system_text(),
            messages,
            temperature: prompt.temperature,
            stream: streaming.then_some(true),
        };

        let mut headers = BTreeMap::new();
        headers.insert("anthropic-version".to_string(), API_VERSION.to_string());

        Ok(BackendRequest {
            endpoint: ENDPOINT.to_string(),
            headers,
            payload: serde_json::to_value(request)
                .map_err(|e| malformed(self.tag.as_str(), &self.model, e))?,
        })
    }

    fn decode_completion(&self, body: &[u8]) -> GatewayResult<String> {
        let response: MessagesResponse = serde_json::from_slice(body)
            .map_err(|e| malformed(self.tag.as_str(), &self.model, e))?;

        Ok(response
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .collect())
    }

    fn decode_stream_event(&self, data: &str) -> GatewayResult<StreamEvent> {
        let event: StreamPayload = serde_json::from_str(data).map_err(malformed_event)?;

        match event {
            StreamPayload::ContentBlockDelta {
                delta: BlockDelta::TextDelta { text },
            } => Ok(StreamEvent::Delta(text)),
            StreamPayload::MessageStop => Ok(StreamEvent::Done),
            StreamPayload::Error { error } => Err(GatewayError::streaming(format!(
                "{}: {}",
                error.error_type, error.message
            ))),
            StreamPayload::ContentBlockDelta { .. } | StreamPayload::Other => {
                Ok(StreamEvent::Skip)
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<MessageParam<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Debug, Serialize)]
struct MessageParam<'a> {
    role: MessageRole,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamPayload {
    ContentBlockDelta {
        delta: BlockDelta,
    },
    MessageStop,
    Error {
        error: StreamError,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum BlockDelta {
    TextDelta {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct StreamError {
    #[serde(rename = "type", default)]
    error_type: String,
    #[serde(default)]
    message: String,
}
