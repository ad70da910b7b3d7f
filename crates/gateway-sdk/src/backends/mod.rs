//! Backend adapters.
//!
//! Each adapter translates a [`Prompt`](gateway_core::Prompt) into its
//! provider's payload and reads that provider's responses back. Adapters do
//! no I/O of their own; every request travels through the gateway.

mod anthropic;
mod openai;

pub use anthropic::AnthropicMessages;
pub use openai::OpenAiChat;

use gateway_core::GatewayError;

/// Malformed body from a backend
pub(crate) fn malformed(provider: &str, model: &str, detail: impl std::fmt::Display) -> GatewayError {
    GatewayError::candidate(provider, model, format!("malformed response: {detail}"), None, false)
}

/// Malformed server-sent event from a backend
pub(crate) fn malformed_event(detail: impl std::fmt::Display) -> GatewayError {
    GatewayError::streaming(format!("malformed stream event: {detail}"))
}
