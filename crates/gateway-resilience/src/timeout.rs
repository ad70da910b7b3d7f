//! Per-attempt timeout management.
//!
//! The budget bounds a single candidate attempt: sending the envelope and
//! classifying the reply, which for a complete response includes reading the
//! whole body. A streamed body is handed to the caller unread and is not
//! covered. The budget does not bound the whole fallback chain.

use gateway_core::{GatewayError, GatewayResult};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Time budget for one attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AttemptTimeout {
    limit: Option<Duration>,
}

impl AttemptTimeout {
    /// Create a budget; `None` means unbounded
    #[must_use]
    pub fn new(limit: Option<Duration>) -> Self {
        Self { limit }
    }

    /// Create a budget from milliseconds
    #[must_use]
    pub fn from_millis(millis: Option<u64>) -> Self {
        Self::new(millis.map(Duration::from_millis))
    }

    /// The configured limit
    pub fn limit(&self) -> Option<Duration> {
        self.limit
    }

    /// Run `operation` within the budget
    ///
    /// # Errors
    /// Returns `GatewayError::Timeout` if the budget elapses, otherwise the
    /// operation's own result
    pub async fn run<F, T>(&self, operation: F) -> GatewayResult<T>
    where
        F: Future<Output = GatewayResult<T>>,
    {
        match self.limit {
            None => operation.await,
            Some(limit) => match tokio::time::timeout(limit, operation).await {
                Ok(result) => result,
                Err(_) => {
                    let duration_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
                    warn!(timeout_ms = duration_ms, "Attempt exceeded its time budget");
                    Err(GatewayError::timeout(duration_ms))
                }
            },
        }
    }
}
