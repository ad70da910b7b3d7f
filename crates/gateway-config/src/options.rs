//! Per-request gateway options.
//!
//! Every field is optional; an absent field means "use the gateway default".
//! Provider-level defaults and per-call overrides are combined with [`merge`].

use gateway_core::GatewayResult;
use gateway_resilience::{AttemptTimeout, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Gateway directives attached to a request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestOptions {
    /// Explicit cache key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_key: Option<String>,

    /// Cache lifetime in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_ttl_seconds: Option<u64>,

    /// Bypass the gateway cache
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_cache: Option<bool>,

    /// Custom metadata recorded with the gateway log entry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,

    /// Whether the gateway should store a log entry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collect_log: Option<bool>,

    /// Caller-supplied event identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,

    /// Time budget for each attempt, in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_ms: Option<u64>,

    /// Retry policy applied to each candidate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_policy: Option<RetryPolicy>,
}

impl RequestOptions {
    /// Create empty options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder
    #[must_use]
    pub fn builder() -> RequestOptionsBuilder {
        RequestOptionsBuilder::default()
    }

    /// Check whether no option is set
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Layer `overrides` on top of these options
    #[must_use]
    pub fn merged_with(&self, overrides: &Self) -> Self {
        merge(self, overrides)
    }

    /// Retry policy in force, falling back to a single attempt
    pub fn effective_retry_policy(&self) -> RetryPolicy {
        self.retry_policy.unwrap_or_default()
    }

    /// Per-attempt time budget
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    /// Per-attempt timeout guard
    pub fn attempt_timeout(&self) -> AttemptTimeout {
        AttemptTimeout::from_millis(self.request_timeout_ms)
    }
}

/// Combine provider defaults with per-call overrides
///
/// A field present in `overrides` replaces the one in `defaults`. The retry
/// policy and the metadata map are each replaced as a whole.
#[must_use]
pub fn merge(defaults: &RequestOptions, overrides: &RequestOptions) -> RequestOptions {
    fn pick<T: Clone>(base: &Option<T>, over: &Option<T>) -> Option<T> {
        over.as_ref().or(base.as_ref()).cloned()
    }

    RequestOptions {
        cache_key: pick(&defaults.cache_key, &overrides.cache_key),
        cache_ttl_seconds: overrides.cache_ttl_seconds.or(defaults.cache_ttl_seconds),
        skip_cache: overrides.skip_cache.or(defaults.skip_cache),
        metadata: pick(&defaults.metadata, &overrides.metadata),
        collect_log: overrides.collect_log.or(defaults.collect_log),
        event_id: pick(&defaults.event_id, &overrides.event_id),
        request_timeout_ms: overrides.request_timeout_ms.or(defaults.request_timeout_ms),
        retry_policy: overrides.retry_policy.or(defaults.retry_policy),
    }
}

/// Builder for request options
#[derive(Debug, Clone, Default)]
pub struct RequestOptionsBuilder {
    options: RequestOptions,
}

impl RequestOptionsBuilder {
    /// Set the cache key
    #[must_use]
    pub fn cache_key(mut self, key: impl Into<String>) -> Self {
        self.options.cache_key = Some(key.into());
        self
    }

    /// Set the cache lifetime
    #[must_use]
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.options.cache_ttl_seconds = Some(ttl.as_secs());
        self
    }

    /// Set the cache lifetime in seconds
    #[must_use]
    pub fn cache_ttl_seconds(mut self, seconds: u64) -> Self {
        self.options.cache_ttl_seconds = Some(seconds);
        self
    }

    /// Bypass the cache
    #[must_use]
    pub fn skip_cache(mut self, skip: bool) -> Self {
        self.options.skip_cache = Some(skip);
        self
    }

    /// Add one metadata entry
    #[must_use]
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options
            .metadata
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Toggle gateway log collection
    #[must_use]
    pub fn collect_log(mut self, collect: bool) -> Self {
        self.options.collect_log = Some(collect);
        self
    }

    /// Set the event identifier
    #[must_use]
    pub fn event_id(mut self, id: impl Into<String>) -> Self {
        self.options.event_id = Some(id.into());
        self
    }

    /// Set the per-attempt time budget
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.options.request_timeout_ms =
            Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Set the per-attempt time budget in milliseconds
    #[must_use]
    pub fn request_timeout_ms(mut self, millis: u64) -> Self {
        self.options.request_timeout_ms = Some(millis);
        self
    }

    /// Set the retry policy
    #[must_use]
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.options.retry_policy = Some(policy);
        self
    }

    /// Set the retry policy from its parts
    ///
    /// # Errors
    /// Returns a configuration error if `max_attempts` is outside `1..=5`
    pub fn retries(
        self,
        max_attempts: u32,
        retry_delay_ms: u64,
        backoff: gateway_resilience::Backoff,
    ) -> GatewayResult<Self> {
        let policy = RetryPolicy::new(max_attempts, retry_delay_ms, backoff)?;
        Ok(self.retry_policy(policy))
    }

    /// Build the options
    #[must_use]
    pub fn build(self) -> RequestOptions {
        self.options
    }
}
