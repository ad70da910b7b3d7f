//! # AI Gateway Fallback
//!
//! Ordered multi-model fallback routed through an AI gateway.
//!
//! This crate re-exports the caller-facing SDK together with the tracing
//! setup, so applications can depend on a single crate:
//!
//! ```rust,no_run
//! use ai_gateway_fallback::{
//!     create_provider, init_tracing, CandidateModel, GatewayIdentity, OpenAiChat, Prompt,
//!     TracingConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tracer = init_tracing(&TracingConfig::default())?;
//!
//!     let provider = create_provider(GatewayIdentity::with_api_key("acct", "prod", "key"), None)?;
//!     let model = provider.model(CandidateModel::new(OpenAiChat::new("gpt-4o-mini")))?;
//!     println!("{}", model.generate_text(&Prompt::user("Hello")).await?);
//!
//!     ai_gateway_fallback::shutdown_tracing(tracer);
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub use gateway_sdk::*;
pub use gateway_telemetry::{init_tracing, shutdown_tracing, TracingConfig, TracingError};

/// Settings documents and configuration errors
pub mod config {
    pub use gateway_config::{ConfigError, OptionSettings, ProviderSettings, RetrySettings, SettingsFormat};
}
