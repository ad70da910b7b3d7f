//! Backend capability and candidate model references.
//!
//! A backend knows how to express a prompt as its own payload and how to read
//! its own responses back. It never performs I/O: the gateway transport does.

use crate::error::{GatewayError, GatewayResult};
use crate::request::Prompt;
use serde_json::Value;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Provider tag understood by the gateway (e.g. `openai`, `anthropic`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProviderTag(Cow<'static, str>);

impl ProviderTag {
    /// OpenAI
    pub const OPENAI: Self = Self(Cow::Borrowed("openai"));
    /// Anthropic
    pub const ANTHROPIC: Self = Self(Cow::Borrowed("anthropic"));
    /// Workers AI
    pub const WORKERS_AI: Self = Self(Cow::Borrowed("workers-ai"));
    /// Google AI Studio
    pub const GOOGLE_AI_STUDIO: Self = Self(Cow::Borrowed("google-ai-studio"));
    /// Groq
    pub const GROQ: Self = Self(Cow::Borrowed("groq"));
    /// Mistral
    pub const MISTRAL: Self = Self(Cow::Borrowed("mistral"));

    /// Create a custom provider tag
    ///
    /// # Errors
    /// Returns a configuration error unless the tag is non-empty and made of
    /// lowercase ASCII letters, digits, `-` or `_`
    pub fn new(tag: impl Into<String>) -> GatewayResult<Self> {
        let tag = tag.into();
        let valid = !tag.is_empty()
            && tag
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_');
        if !valid {
            return Err(GatewayError::configuration(format!(
                "invalid provider tag '{tag}'"
            )));
        }
        Ok(Self(Cow::Owned(tag)))
    }

    /// Get the tag as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Backend-specific part of a gateway request
#[derive(Debug, Clone, PartialEq)]
pub struct BackendRequest {
    /// Provider endpoint relative to the provider root (e.g. `chat/completions`)
    pub endpoint: String,
    /// Headers forwarded to the provider
    pub headers: BTreeMap<String, String>,
    /// Provider payload
    pub payload: Value,
}

/// One decoded server-sent event from a backend stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A text fragment
    Delta(String),
    /// The backend signalled completion
    Done,
    /// An event that carries no text (role announcements, pings, usage)
    Skip,
}

/// Capability every backend model exposes to the dispatcher
///
/// Backends are adapted to this trait at the boundary; the dispatcher treats
/// all of them identically regardless of provider.
pub trait BackendModel: Send + Sync + fmt::Debug {
    /// Provider tag used in the gateway path
    fn provider(&self) -> &ProviderTag;

    /// Backend model identifier
    fn model_id(&self) -> &str;

    /// Translate a prompt into this backend's request
    ///
    /// # Errors
    /// Returns a configuration error if the prompt cannot be expressed
    fn prepare(&self, prompt: &Prompt, streaming: bool) -> GatewayResult<BackendRequest>;

    /// Extract the completion text from a buffered response body
    ///
    /// # Errors
    /// Returns an error if the body is not a valid response
    fn decode_completion(&self, body: &[u8]) -> GatewayResult<String>;

    /// Decode the `data` field of one server-sent event
    ///
    /// # Errors
    /// Returns an error if the event reports a failure or is malformed
    fn decode_stream_event(&self, data: &str) -> GatewayResult<StreamEvent>;
}

/// Reference to one backend model in a fallback list
#[derive(Clone)]
pub struct CandidateModel {
    backend: Arc<dyn BackendModel>,
}

impl CandidateModel {
    /// Wrap a backend model
    pub fn new(backend: impl BackendModel + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Wrap an already shared backend model
    pub fn from_arc(backend: Arc<dyn BackendModel>) -> Self {
        Self { backend }
    }

    /// Provider tag
    pub fn provider(&self) -> &ProviderTag {
        self.backend.provider()
    }

    /// Backend model identifier
    pub fn model_id(&self) -> &str {
        self.backend.model_id()
    }

    /// The underlying backend capability
    pub fn backend(&self) -> &Arc<dyn BackendModel> {
        &self.backend
    }
}

impl fmt::Debug for CandidateModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CandidateModel")
            .field("provider", &self.provider().as_str())
            .field("model", &self.model_id())
            .finish()
    }
}

impl fmt::Display for CandidateModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.provider(), self.model_id())
    }
}
