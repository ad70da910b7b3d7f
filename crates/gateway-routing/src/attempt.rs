//! Record of one attempt against one candidate.

use gateway_core::{FailureClass, GatewayError};
use std::fmt;
use std::time::Duration;

/// How an attempt ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The candidate produced a response
    Succeeded,
    /// Transient failure; the candidate may be tried again
    RetryableFailure(String),
    /// Permanent failure for this candidate
    NonRetryableFailure(String),
    /// Failure that ends the whole dispatch
    Fatal(String),
}

impl AttemptOutcome {
    /// Classify a failed attempt
    pub fn from_error(error: &GatewayError) -> Self {
        let reason = error.to_string();
        match error.class() {
            FailureClass::Retryable => Self::RetryableFailure(reason),
            FailureClass::NonRetryable => Self::NonRetryableFailure(reason),
            FailureClass::Fatal => Self::Fatal(reason),
        }
    }

    /// Check for success
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    /// Failure class, `None` on success
    pub fn failure_class(&self) -> Option<FailureClass> {
        match self {
            Self::Succeeded => None,
            Self::RetryableFailure(_) => Some(FailureClass::Retryable),
            Self::NonRetryableFailure(_) => Some(FailureClass::NonRetryable),
            Self::Fatal(_) => Some(FailureClass::Fatal),
        }
    }

    /// Failure reason, `None` on success
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Succeeded => None,
            Self::RetryableFailure(r) | Self::NonRetryableFailure(r) | Self::Fatal(r) => Some(r),
        }
    }
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded => write!(f, "succeeded"),
            Self::RetryableFailure(r) => write!(f, "retryable failure: {r}"),
            Self::NonRetryableFailure(r) => write!(f, "non-retryable failure: {r}"),
            Self::Fatal(r) => write!(f, "fatal: {r}"),
        }
    }
}

/// One attempt against one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchAttempt {
    /// Position of the candidate in the fallback list
    pub candidate_index: usize,
    /// Attempt number for this candidate, starting at 1
    pub attempt: u32,
    /// Provider tag
    pub provider: String,
    /// Backend model identifier
    pub model_id: String,
    /// How the attempt ended
    pub outcome: AttemptOutcome,
    /// Time from sending the envelope to classifying the reply
    pub elapsed: Duration,
}
