//! OpenAI chat completions adapter.
//!
//! Also serves OpenAI-compatible providers behind the gateway (Groq, Mistral,
//! Workers AI) through [`OpenAiChat::compatible`].

use super::{malformed, malformed_event};
use gateway_core::{
    BackendModel, BackendRequest, ChatMessage, GatewayResult, Prompt, ProviderTag, StreamEvent,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const ENDPOINT: &str = "chat/completions";
const DONE_SENTINEL: &str = "[DONE]";

/// OpenAI chat completions model
#[derive(Debug, Clone)]
pub struct OpenAiChat {
    tag: ProviderTag,
    model: String,
}

impl OpenAiChat {
    /// OpenAI model by identifier (e.g. `gpt-4o-mini`)
    pub fn new(model: impl Into<String>) -> Self {
        Self::compatible(ProviderTag::OPENAI, model)
    }

    /// Model from a provider speaking the OpenAI chat format
    pub fn compatible(tag: ProviderTag, model: impl Into<String>) -> Self {
        Self {
            tag,
            model: model.into(),
        }
    }
}

impl BackendModel for OpenAiChat {
    fn provider(&self) -> &ProviderTag {
        &self.tag
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    fn prepare(&self, prompt: &Prompt, streaming: bool) -> GatewayResult<BackendRequest> {
        let request = ChatRequest {
            model: &self.model,
            messages: &prompt.messages,
            max_tokens: prompt.max_tokens,
            temperature: prompt.temperature,
            stream: streaming.then_some(true),
        };

        Ok(BackendRequest {
            endpoint: ENDPOINT.to_string(),
            headers: BTreeMap::new(),
            payload: serde_json::to_value(request)
                .map_err(|e| malformed(self.tag.as_str(), &self.model, e))?,
        })
    }

    fn decode_completion(&self, body: &[u8]) -> GatewayResult<String> {
        let response: ChatResponse = serde_json::from_slice(body)
            .map_err(|e| malformed(self.tag.as_str(), &self.model, e))?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| malformed(self.tag.as_str(), &self.model, "no choices"))
    }

    fn decode_stream_event(&self, data: &str) -> GatewayResult<StreamEvent> {
        if data.trim() == DONE_SENTINEL {
            return Ok(StreamEvent::Done);
        }

        let chunk: ChatChunk = serde_json::from_str(data).map_err(malformed_event)?;
        let delta = chunk
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .filter(|text| !text.is_empty());

        Ok(delta.map_or(StreamEvent::Skip, StreamEvent::Delta))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}
