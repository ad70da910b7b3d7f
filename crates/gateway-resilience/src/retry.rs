//! Retry policy with configurable backoff.
//!
//! A policy bounds how many times one candidate is attempted and how long the
//! dispatcher waits between attempts. Policies are validated on construction
//! and immutable afterwards.

use gateway_core::{GatewayError, GatewayResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Shape of the delay curve between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backoff {
    /// Same delay before every retry
    #[default]
    Constant,
    /// Delay grows by the base delay each attempt
    Linear,
    /// Delay doubles each attempt
    Exponential,
}

impl std::fmt::Display for Backoff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Constant => write!(f, "constant"),
            Self::Linear => write!(f, "linear"),
            Self::Exponential => write!(f, "exponential"),
        }
    }
}

/// Raw form used for deserialization before validation
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RetryPolicyConfig {
    max_attempts: u32,
    #[serde(default)]
    retry_delay_ms: u64,
    #[serde(default)]
    backoff: Backoff,
}

/// Retry policy for a single candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RetryPolicyConfig")]
pub struct RetryPolicy {
    max_attempts: u32,
    retry_delay_ms: u64,
    backoff: Backoff,
}

impl RetryPolicy {
    /// Smallest accepted attempt count
    pub const MIN_ATTEMPTS: u32 = 1;
    /// Largest accepted attempt count
    pub const MAX_ATTEMPTS: u32 = 5;

    /// Create a validated retry policy
    ///
    /// # Errors
    /// Returns a configuration error if `max_attempts` is outside `1..=5`
    pub fn new(max_attempts: u32, retry_delay_ms: u64, backoff: Backoff) -> GatewayResult<Self> {
        if !(Self::MIN_ATTEMPTS..=Self::MAX_ATTEMPTS).contains(&max_attempts) {
            return Err(GatewayError::configuration(format!(
                "max_attempts must be between {} and {}, got {max_attempts}",
                Self::MIN_ATTEMPTS,
                Self::MAX_ATTEMPTS
            )));
        }
        Ok(Self {
            max_attempts,
            retry_delay_ms,
            backoff,
        })
    }

    /// A policy that never retries
    #[must_use]
    pub fn single_attempt() -> Self {
        Self {
            max_attempts: 1,
            retry_delay_ms: 0,
            backoff: Backoff::Constant,
        }
    }

    /// Create a builder
    #[must_use]
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::new()
    }

    /// Maximum attempts per candidate, including the first
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Base delay in milliseconds
    pub fn retry_delay_ms(&self) -> u64 {
        self.retry_delay_ms
    }

    /// Backoff curve
    pub fn backoff(&self) -> Backoff {
        self.backoff
    }

    /// Whether another attempt is allowed after `attempt` (1-based) failed
    pub fn allows_retry_after(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Delay to wait after `attempt` (1-based) failed, before the next one
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        let base = self.retry_delay_ms;
        let millis = match self.backoff {
            Backoff::Constant => base,
            Backoff::Linear => base.saturating_mul(u64::from(attempt)),
            Backoff::Exponential => {
                base.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)))
            }
        };

        debug!(attempt, backoff = %self.backoff, delay_ms = millis, "Computed retry delay");
        Duration::from_millis(millis)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::single_attempt()
    }
}

impl TryFrom<RetryPolicyConfig> for RetryPolicy {
    type Error = GatewayError;

    fn try_from(config: RetryPolicyConfig) -> Result<Self, Self::Error> {
        Self::new(config.max_attempts, config.retry_delay_ms, config.backoff)
    }
}

/// Builder for retry policy
#[derive(Debug, Clone)]
pub struct RetryPolicyBuilder {
    max_attempts: u32,
    retry_delay_ms: u64,
    backoff: Backoff,
}

impl RetryPolicyBuilder {
    /// Create a new builder
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_attempts: 1,
            retry_delay_ms: 0,
            backoff: Backoff::Constant,
        }
    }

    /// Set max attempts
    #[must_use]
    pub fn max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n;
        self
    }

    /// Set base delay
    #[must_use]
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set base delay in milliseconds
    #[must_use]
    pub fn retry_delay_ms(mut self, millis: u64) -> Self {
        self.retry_delay_ms = millis;
        self
    }

    /// Set backoff curve
    #[must_use]
    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Build the policy
    ///
    /// # Errors
    /// Returns a configuration error if `max_attempts` is outside `1..=5`
    pub fn build(self) -> GatewayResult<RetryPolicy> {
        RetryPolicy::new(self.max_attempts, self.retry_delay_ms, self.backoff)
    }
}

impl Default for RetryPolicyBuilder {
    fn default() -> Self {
        Self::new()
    }
}
