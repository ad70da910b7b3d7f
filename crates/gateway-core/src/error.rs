//! Error types for gateway dispatch.
//!
//! Every failure is sorted into one of three classes. Retryable and
//! non-retryable failures belong to a single candidate and are absorbed by the
//! fallback dispatcher; fatal failures end the whole dispatch.

use std::fmt::Write as _;
use thiserror::Error;

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// How the dispatcher should react to a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Transient; the same candidate may be tried again.
    Retryable,
    /// Permanent for this candidate; advance to the next one.
    NonRetryable,
    /// Ends the dispatch; no other candidate is consulted.
    Fatal,
}

/// Errors produced while resolving and dispatching a request.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Bad identity or options, detected before any network activity.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },

    /// The gateway rejected the caller's credentials.
    #[error("Gateway authentication failed: {message}")]
    Authentication {
        /// Message reported by the gateway.
        message: String,
    },

    /// The named gateway does not exist for the account.
    #[error("Gateway not found: {gateway}")]
    GatewayNotFound {
        /// Gateway name that was requested.
        gateway: String,
    },

    /// One backend failed to produce a response.
    #[error("Candidate {provider}/{model} failed: {message}")]
    CandidateInvocation {
        /// Provider tag of the candidate.
        provider: String,
        /// Backend model identifier.
        model: String,
        /// Failure description.
        message: String,
        /// HTTP status returned through the gateway, if any.
        status_code: Option<u16>,
        /// Whether retrying the same candidate can help.
        retryable: bool,
    },

    /// A single attempt exceeded its time budget.
    #[error("Attempt timed out after {duration_ms}ms")]
    Timeout {
        /// Time budget in milliseconds.
        duration_ms: u64,
    },

    /// The transport failed before a reply was received.
    #[error("Transport error: {message}")]
    Transport {
        /// Failure description.
        message: String,
        /// Whether the failure looks transient.
        retryable: bool,
    },

    /// Every candidate failed; one entry per candidate, in list order.
    #[error("All {} candidates failed: {}", .failures.len(), summarize(.failures))]
    AllCandidatesFailed {
        /// Per-candidate failures in candidate order.
        failures: Vec<CandidateFailure>,
    },

    /// The caller abandoned the request.
    #[error("Request cancelled by caller")]
    Cancelled,

    /// The response stream failed after it was handed to the caller.
    #[error("Streaming error: {message}")]
    Streaming {
        /// Failure description.
        message: String,
    },
}

/// Why one candidate was given up on.
#[derive(Debug)]
pub struct CandidateFailure {
    /// Position of the candidate in the fallback list.
    pub index: usize,
    /// Provider tag of the candidate.
    pub provider: String,
    /// Backend model identifier.
    pub model: String,
    /// Number of attempts made against this candidate.
    pub attempts: u32,
    /// The error from the final attempt.
    pub error: GatewayError,
}

fn summarize(failures: &[CandidateFailure]) -> String {
    let mut out = String::new();
    for (i, failure) in failures.iter().enumerate() {
        if i > 0 {
            out.push_str("; ");
        }
        let _ = write!(
            out,
            "[{}] {}/{} after {} attempt(s): {}",
            failure.index, failure.provider, failure.model, failure.attempts, failure.error
        );
    }
    out
}

impl GatewayError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Create a gateway-not-found error.
    pub fn gateway_not_found(gateway: impl Into<String>) -> Self {
        Self::GatewayNotFound {
            gateway: gateway.into(),
        }
    }

    /// Create a candidate invocation error.
    pub fn candidate(
        provider: impl Into<String>,
        model: impl Into<String>,
        message: impl Into<String>,
        status_code: Option<u16>,
        retryable: bool,
    ) -> Self {
        Self::CandidateInvocation {
            provider: provider.into(),
            model: model.into(),
            message: message.into(),
            status_code,
            retryable,
        }
    }

    /// Create a timeout error.
    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }

    /// Create a transport error.
    pub fn transport(message: impl Into<String>, retryable: bool) -> Self {
        Self::Transport {
            message: message.into(),
            retryable,
        }
    }

    /// Create a streaming error.
    pub fn streaming(message: impl Into<String>) -> Self {
        Self::Streaming {
            message: message.into(),
        }
    }

    /// Classify the error for the dispatcher.
    pub fn class(&self) -> FailureClass {
        match self {
            Self::CandidateInvocation { retryable, .. } | Self::Transport { retryable, .. } => {
                if *retryable {
                    FailureClass::Retryable
                } else {
                    FailureClass::NonRetryable
                }
            }
            Self::Timeout { .. } => FailureClass::Retryable,
            Self::Streaming { .. } | Self::AllCandidatesFailed { .. } => FailureClass::NonRetryable,
            Self::Configuration { .. }
            | Self::Authentication { .. }
            | Self::GatewayNotFound { .. }
            | Self::Cancelled => FailureClass::Fatal,
        }
    }

    /// Check if the error is retryable.
    pub fn is_retryable(&self) -> bool {
        self.class() == FailureClass::Retryable
    }

    /// Check if the error ends the dispatch outright.
    pub fn is_fatal(&self) -> bool {
        self.class() == FailureClass::Fatal
    }

    /// Get the HTTP status code if available.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::CandidateInvocation { status_code, .. } => *status_code,
            Self::Authentication { .. } => Some(401),
            _ => None,
        }
    }

    /// Attach the failing candidate's identity to a transport-level error.
    ///
    /// Fatal errors pass through unchanged.
    #[must_use]
    pub fn for_candidate(self, provider: &str, model: &str) -> Self {
        match self {
            Self::Timeout { duration_ms } => Self::candidate(
                provider,
                model,
                format!("timed out after {duration_ms}ms"),
                None,
                true,
            ),
            Self::Transport { message, retryable } => {
                Self::candidate(provider, model, message, None, retryable)
            }
            Self::Streaming { message } => Self::candidate(provider, model, message, None, true),
            other => other,
        }
    }
}

/// Check if an HTTP status returned through the gateway is worth retrying.
pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500..=599)
}
