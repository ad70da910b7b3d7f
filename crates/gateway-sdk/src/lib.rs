//! # AI Gateway Fallback SDK
//!
//! Presents an ordered list of language models as a single model. Every
//! request is routed through an AI gateway; when a candidate fails, the next
//! one in the list is tried.
//!
//! ## Features
//!
//! - Async-first design with full `tokio` support
//! - Ordered fallback with per-candidate retries and backoff
//! - Gateway caching, logging and metadata directives per request
//! - Streaming responses with Server-Sent Events
//! - API key or runtime binding authentication
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gateway_sdk::{
//!     create_provider, AnthropicMessages, CandidateModel, GatewayIdentity, OpenAiChat, Prompt,
//!     RequestOptions,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), gateway_sdk::GatewayError> {
//!     let identity = GatewayIdentity::with_api_key("my-account", "prod", "gateway-key");
//!     let provider = create_provider(identity, Some(RequestOptions::builder().cache_ttl_seconds(300).build()))?;
//!
//!     let model = provider.fallback(
//!         vec![
//!             CandidateModel::new(AnthropicMessages::new("claude-3-5-haiku-latest")),
//!             CandidateModel::new(OpenAiChat::new("gpt-4o-mini")),
//!         ],
//!         None,
//!     )?;
//!
//!     let text = model.generate_text(&Prompt::user("Hello, world!")).await?;
//!     println!("Response: {text}");
//!     Ok(())
//! }
//! ```
//!
//! ## Streaming
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! # use gateway_sdk::{FallbackModel, Prompt};
//! # async fn example(model: &FallbackModel) -> Result<(), gateway_sdk::GatewayError> {
//! let mut stream = model.stream_text(&Prompt::user("Tell me a story")).await?;
//! while let Some(chunk) = stream.next().await {
//!     match chunk {
//!         Ok(text) => print!("{text}"),
//!         Err(e) => eprintln!("Error: {e}"),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
mod config;
mod provider;
mod transport;

pub use backends::{AnthropicMessages, OpenAiChat};
pub use config::TransportConfig;
pub use provider::{
    create_provider, create_provider_with_config, create_provider_with_transport, ChatBuilder,
    FallbackModel, ProviderHandle,
};
pub use transport::HttpTransport;

pub use gateway_config::{merge, AuthMode, GatewayIdentity, RequestOptions, RequestOptionsBuilder};
pub use gateway_core::{
    BackendModel, BackendRequest, CandidateFailure, CandidateModel, ChatMessage, Envelope,
    FailureClass, GatewayError, GatewayMetadata, GatewayReply, GatewayResult, GatewayTransport,
    InvokeMode, LanguageModel, MessageRole, ModelResponse, Prompt, ProviderTag, ReplyBody,
    StreamEvent, TextStream,
};
pub use gateway_resilience::{Backoff, RetryPolicy};
pub use gateway_routing::{AttemptOutcome, DispatchAttempt, ResolvedResponse, ServedBy};
pub use tokio_util::sync::CancellationToken;
