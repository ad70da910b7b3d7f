//! Gateway authentication and request lifecycle integration tests

use crate::fixtures::*;
use crate::helpers::*;
use crate::mock_gateway::*;
use gateway_sdk::{create_provider, GatewayError, GatewayIdentity, InvokeMode, CancellationToken};
use std::time::Duration;
use wiremock::matchers::{header, method};
use wiremock::{Mock, ResponseTemplate};

/// Test the gateway key travels in the gateway authorization header
#[tokio::test]
async fn test_api_key_header() {
    let gateway = MockGateway::start().await;
    Mock::given(method("POST"))
        .and(header("cf-aig-authorization", "Bearer gw-test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_json_response(OPENAI_MODEL, "ok")))
        .expect(1)
        .mount(&gateway.server)
        .await;

    let model = fallback_for(&gateway, vec![openai_candidate()], None);
    assert_eq!(model.generate_text(&simple_prompt()).await.unwrap(), "ok");
}

/// Test an empty key fails before any gateway call
#[tokio::test]
async fn test_empty_key_rejected_without_calls() {
    let gateway = MockGateway::start().await;
    gateway.mock_openai_completion("never").await;

    let err = create_provider(gateway.identity_with_key("   "), None).unwrap_err();
    assert!(matches!(err, GatewayError::Configuration { .. }));
    assert!(gateway.requests().await.is_empty());
}

/// Test malformed identities are rejected
#[test]
fn test_invalid_identity_segments() {
    for (account, gateway) in [("", "prod"), ("acct", ""), ("acct/../x", "prod"), ("acct", "prod gw")] {
        let identity = GatewayIdentity::with_api_key(account, gateway, TEST_API_KEY);
        assert!(
            matches!(create_provider(identity, None), Err(GatewayError::Configuration { .. })),
            "{account:?}/{gateway:?}"
        );
    }
}

/// Test rejected credentials end the dispatch without trying other candidates
#[tokio::test]
async fn test_unauthorized_short_circuits() {
    let gateway = MockGateway::start().await;
    gateway
        .mock_gateway_error(401, 2009, "Unauthorized")
        .await;

    let model = fallback_for(&gateway, anthropic_then_openai(), None);
    let err = model
        .dispatch(&simple_prompt(), InvokeMode::Complete)
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::Authentication { .. }));
    assert!(err.is_fatal());
    assert_eq!(gateway.providers_called().await, vec!["anthropic"]);
}

/// Test an unknown gateway ends the dispatch and names the gateway
#[tokio::test]
async fn test_gateway_not_found_short_circuits() {
    let gateway = MockGateway::start().await;
    gateway
        .mock_gateway_error(400, 2001, "Gateway not found")
        .await;

    let model = fallback_for(&gateway, anthropic_then_openai(), None);
    let err = model
        .dispatch(&simple_prompt(), InvokeMode::Complete)
        .await
        .unwrap_err();

    match err {
        GatewayError::GatewayNotFound { gateway: name } => assert_eq!(name, TEST_GATEWAY),
        other => panic!("expected GatewayNotFound, got {other:?}"),
    }
    assert_eq!(gateway.requests().await.len(), 1);
}

/// Test cancelling an in-flight dispatch
#[tokio::test]
async fn test_cancel_in_flight() {
    let gateway = MockGateway::start().await;
    gateway
        .mock_openai_delayed("slow", Duration::from_secs(5))
        .await;

    let model = fallback_for(&gateway, vec![openai_candidate()], None);
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    let server = &gateway;
    let prompt = simple_prompt();
    let (result, ()) = tokio::join!(
        model.invoke_with_cancellation(&prompt, InvokeMode::Complete, &cancel),
        async move {
            wait_for(
                || async { !server.requests().await.is_empty() },
                Duration::from_secs(2),
            )
            .await;
            trigger.cancel();
        }
    );

    assert!(matches!(result, Err(GatewayError::Cancelled)));
}
