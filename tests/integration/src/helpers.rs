//! Test helper utilities for integration tests

use crate::fixtures::*;
use crate::mock_gateway::MockGateway;
use gateway_sdk::{
    create_provider, Backoff, CandidateModel, FallbackModel, ProviderHandle, RequestOptions,
    RetryPolicy,
};
use gateway_telemetry::{init_tracing as init_subscriber, TracingConfig};
use once_cell::sync::Lazy;
use std::future::Future;
use std::time::Duration;

/// Initialize tracing for tests (only once)
static TRACING: Lazy<()> = Lazy::new(|| {
    if let Ok(level) = std::env::var("TEST_LOG") {
        let config = TracingConfig::new("integration-tests").with_log_level(level);
        let _ = init_subscriber(&config);
    }
});

/// Initialize tracing for tests
pub fn init_tracing() {
    Lazy::force(&TRACING);
}

/// Provider handle for the mock gateway
pub fn provider_for(gateway: &MockGateway, defaults: Option<RequestOptions>) -> ProviderHandle {
    init_tracing();
    create_provider(gateway.identity(), defaults).expect("Failed to create provider")
}

/// Fallback model over `candidates` on the mock gateway
pub fn fallback_for(
    gateway: &MockGateway,
    candidates: Vec<CandidateModel>,
    options: Option<RequestOptions>,
) -> FallbackModel {
    provider_for(gateway, None)
        .fallback(candidates, options)
        .expect("Failed to create fallback model")
}

/// Anthropic first, OpenAI second
pub fn anthropic_then_openai() -> Vec<CandidateModel> {
    vec![anthropic_candidate(), openai_candidate()]
}

/// Options with a retry policy
pub fn retry_options(max_attempts: u32, delay_ms: u64, backoff: Backoff) -> RequestOptions {
    RequestOptions::builder()
        .retry_policy(RetryPolicy::new(max_attempts, delay_ms, backoff).expect("valid retry policy"))
        .build()
}

/// Wait for a condition to become true with timeout
pub async fn wait_for<F, Fut>(condition: F, timeout: Duration) -> bool
where
    F: Fn() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = std::time::Instant::now();
    while start.elapsed() < timeout {
        if condition().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
