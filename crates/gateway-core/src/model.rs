//! Uniform invocation interface.
//!
//! A single backend wrapped for the gateway and an ordered fallback list both
//! implement [`LanguageModel`], so callers cannot tell them apart.

use crate::error::GatewayResult;
use crate::request::Prompt;
use crate::streaming::TextStream;
use crate::transport::GatewayMetadata;
use async_trait::async_trait;

/// Whether the caller wants the response incrementally
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvokeMode {
    /// One buffered completion
    #[default]
    Complete,
    /// Incremental text deltas
    Stream,
}

impl InvokeMode {
    /// Check if streaming was requested
    pub fn is_streaming(self) -> bool {
        matches!(self, Self::Stream)
    }
}

/// Response returned by [`LanguageModel::invoke`]
#[derive(Debug)]
pub struct ModelResponse {
    /// Provider that produced the response
    pub provider: String,
    /// Model that produced the response
    pub model_id: String,
    /// Response text
    pub content: TextStream,
    /// Gateway metadata for the serving request
    pub metadata: GatewayMetadata,
}

impl ModelResponse {
    /// Consume the response and gather its full text
    pub async fn text(self) -> GatewayResult<String> {
        self.content.collect_text().await
    }
}

/// Invocation capability shared by every model the caller can hold
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Provider of the primary backend
    fn provider(&self) -> &str;

    /// Model identifier of the primary backend
    fn model_id(&self) -> &str;

    /// Produce a completion or a stream for `prompt`
    async fn invoke(&self, prompt: &Prompt, mode: InvokeMode) -> GatewayResult<ModelResponse>;
}
