//! Fallback integration tests
//!
//! Tests for ordered fallback through the gateway: candidate order, retries
//! with backoff, failure aggregation and per-attempt timeouts.

use crate::fixtures::*;
use crate::helpers::*;
use crate::mock_gateway::*;
use gateway_sdk::{
    AttemptOutcome, Backoff, GatewayError, InvokeMode, LanguageModel, RequestOptions,
};
use pretty_assertions::assert_eq;
use std::time::{Duration, Instant};

/// Test the first candidate serves and later candidates are never called
#[tokio::test]
async fn test_primary_serves() {
    let gateway = MockGateway::start().await;
    gateway.mock_anthropic_completion("from anthropic").await;
    gateway.mock_openai_completion("from openai").await;

    let model = fallback_for(&gateway, anthropic_then_openai(), None);
    let response = model
        .dispatch(&simple_prompt(), InvokeMode::Complete)
        .await
        .unwrap();

    assert_eq!(response.served_by.index, 0);
    assert_eq!(response.served_by.provider, "anthropic");
    assert_eq!(response.gateway_metadata.cache_status(), Some("HIT"));
    assert_eq!(response.attempts.len(), 1);
    assert_eq!(response.content.collect_text().await.unwrap(), "from anthropic");
    assert_eq!(gateway.providers_called().await, vec!["anthropic"]);
}

/// Test a non-retryable failure moves straight to the next candidate
#[tokio::test]
async fn test_non_retryable_failure_falls_back() {
    let gateway = MockGateway::start().await;
    gateway.mock_always_status("anthropic", 400).await;
    gateway.mock_openai_completion("from openai").await;

    let model = fallback_for(
        &gateway,
        anthropic_then_openai(),
        Some(retry_options(3, 10, Backoff::Constant)),
    );
    let response = model
        .dispatch(&simple_prompt(), InvokeMode::Complete)
        .await
        .unwrap();

    assert_eq!(response.served_by.index, 1);
    assert_eq!(response.attempts_for(0).count(), 1);
    assert_eq!(gateway.providers_called().await, vec!["anthropic", "openai"]);
}

/// Test two 503s with one retry, then OpenAI serves
#[tokio::test]
async fn test_retry_then_fallback() {
    let gateway = MockGateway::start().await;
    gateway.mock_status("anthropic", 503, 2).await;
    gateway.mock_openai_completion("rescued").await;

    let model = fallback_for(
        &gateway,
        anthropic_then_openai(),
        Some(retry_options(2, 500, Backoff::Constant)),
    );

    let started = Instant::now();
    let response = model
        .dispatch(&simple_prompt(), InvokeMode::Complete)
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert_eq!(response.served_by.provider, "openai");
    assert_eq!(response.attempts_for(0).count(), 2);
    assert_eq!(response.attempts_for(1).count(), 1);
    assert!(matches!(
        response.attempts[0].outcome,
        AttemptOutcome::RetryableFailure(_)
    ));
    assert!(elapsed >= Duration::from_millis(500), "elapsed {elapsed:?}");
    assert_eq!(
        gateway.providers_called().await,
        vec!["anthropic", "anthropic", "openai"]
    );
    assert_eq!(response.content.collect_text().await.unwrap(), "rescued");
}

/// Test a candidate recovers within its retry budget
#[tokio::test]
async fn test_retry_recovers_same_candidate() {
    let gateway = MockGateway::start().await;
    gateway.mock_status("openai", 429, 1).await;
    gateway.mock_openai_completion("second time lucky").await;

    let model = fallback_for(
        &gateway,
        vec![openai_candidate(), anthropic_candidate()],
        Some(retry_options(3, 20, Backoff::Exponential)),
    );
    let response = model
        .dispatch(&simple_prompt(), InvokeMode::Complete)
        .await
        .unwrap();

    assert_eq!(response.served_by.index, 0);
    assert_eq!(response.attempts.len(), 2);
    assert_eq!(gateway.providers_called().await, vec!["openai", "openai"]);
}

/// Test every candidate failing yields one reason per candidate, in order
#[tokio::test]
async fn test_all_candidates_fail() {
    let gateway = MockGateway::start().await;
    gateway.mock_always_status("anthropic", 503).await;
    gateway.mock_always_status("openai", 500).await;

    let model = fallback_for(
        &gateway,
        anthropic_then_openai(),
        Some(retry_options(2, 10, Backoff::Linear)),
    );
    let err = model
        .dispatch(&simple_prompt(), InvokeMode::Complete)
        .await
        .unwrap_err();

    match &err {
        GatewayError::AllCandidatesFailed { failures } => {
            assert_eq!(failures.len(), 2);
            assert_eq!(failures[0].provider, "anthropic");
            assert_eq!(failures[0].attempts, 2);
            assert_eq!(failures[0].error.status_code(), Some(503));
            assert_eq!(failures[1].provider, "openai");
            assert_eq!(failures[1].error.status_code(), Some(500));
        }
        other => panic!("expected AllCandidatesFailed, got {other:?}"),
    }
    let message = err.to_string();
    assert!(message.contains("anthropic/claude-3-5-haiku-latest"));
    assert!(message.contains("openai/gpt-4o-mini"));
    assert_eq!(gateway.requests().await.len(), 4);
}

/// Test the per-attempt timeout is retryable and moves on
#[tokio::test]
async fn test_slow_candidate_times_out() {
    let gateway = MockGateway::start().await;
    gateway
        .mock_openai_delayed("too late", Duration::from_secs(5))
        .await;
    gateway.mock_anthropic_completion("on time").await;

    let model = fallback_for(
        &gateway,
        vec![openai_candidate(), anthropic_candidate()],
        Some(RequestOptions::builder().request_timeout_ms(200).build()),
    );

    let started = Instant::now();
    let response = model
        .dispatch(&simple_prompt(), InvokeMode::Complete)
        .await
        .unwrap();

    assert_eq!(response.served_by.provider, "anthropic");
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(matches!(
        response.attempts[0].outcome,
        AttemptOutcome::RetryableFailure(_)
    ));
}

/// Test the uniform interface hides which candidate served
#[tokio::test]
async fn test_invoke_reports_serving_model() {
    let gateway = MockGateway::start().await;
    gateway.mock_always_status("anthropic", 404).await;
    gateway.mock_openai_completion("hello").await;

    let model = fallback_for(&gateway, anthropic_then_openai(), None);
    assert_eq!(model.provider(), "anthropic");

    let response = model
        .invoke(&multi_turn_prompt(), InvokeMode::Complete)
        .await
        .unwrap();
    assert_eq!(response.provider, "openai");
    assert_eq!(response.model_id, OPENAI_MODEL);
    assert_eq!(response.metadata.log_id(), Some("log-openai"));
    assert_eq!(response.text().await.unwrap(), "hello");
}

/// Test gateway directives reach every attempt
#[tokio::test]
async fn test_directives_sent_with_each_attempt() {
    let gateway = MockGateway::start().await;
    gateway.mock_always_status("anthropic", 503).await;
    gateway.mock_openai_completion("ok").await;

    let defaults = RequestOptions::builder()
        .cache_ttl_seconds(300)
        .metadata("team", "search")
        .build();
    let model = provider_for(&gateway, Some(defaults))
        .fallback(
            anthropic_then_openai(),
            Some(RequestOptions::builder().event_id("evt-42").build()),
        )
        .unwrap();

    model.generate_text(&simple_prompt()).await.unwrap();

    let bodies = gateway.bodies().await;
    assert_eq!(bodies.len(), 2);
    for body in &bodies {
        assert_eq!(body["cache_ttl"], 300);
        assert_eq!(body["metadata"]["team"], "search");
        assert_eq!(body["event_id"], "evt-42");
    }
    assert_eq!(bodies[0]["provider"], "anthropic");
    assert_eq!(bodies[0]["endpoint"], "v1/messages");
    assert_eq!(bodies[0]["headers"]["anthropic-version"], "2023-06-01");
    assert_eq!(bodies[1]["provider"], "openai");
    assert_eq!(bodies[1]["query"]["model"], OPENAI_MODEL);
}
