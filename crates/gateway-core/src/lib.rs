//! # Gateway Core
//!
//! Core types, traits, and error handling for AI gateway fallback routing.
//!
//! This crate provides the foundational types used throughout the workspace:
//! - Prompt types submitted by callers
//! - The backend capability trait and candidate model references
//! - The uniform `LanguageModel` invocation trait
//! - The gateway transport seam (envelope in, reply out)
//! - The one-shot text stream handed back to callers
//! - Error types and failure classification

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod backend;
pub mod error;
pub mod model;
pub mod request;
pub mod streaming;
pub mod transport;

// Re-export commonly used types
pub use backend::{BackendModel, BackendRequest, CandidateModel, ProviderTag, StreamEvent};
pub use error::{
    is_retryable_status, CandidateFailure, FailureClass, GatewayError, GatewayResult,
};
pub use model::{InvokeMode, LanguageModel, ModelResponse};
pub use request::{ChatMessage, MessageRole, Prompt};
pub use streaming::TextStream;
pub use transport::{Envelope, GatewayMetadata, GatewayReply, GatewayTransport, ReplyBody};
