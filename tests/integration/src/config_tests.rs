//! Settings file integration tests
//!
//! Settings documents on disk feeding provider creation end to end.

use crate::fixtures::*;
use crate::mock_gateway::*;
use gateway_config::{ConfigError, ProviderSettings};
use gateway_sdk::{create_provider, Backoff, GatewayError, InvokeMode};
use pretty_assertions::assert_eq;
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_settings(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).expect("Failed to create settings file");
    file.write_all(content.as_bytes())
        .expect("Failed to write settings file");
    path
}

/// Test a TOML settings file drives a full dispatch
#[tokio::test]
async fn test_toml_settings_end_to_end() {
    let gateway = MockGateway::start().await;
    gateway.mock_status("anthropic", 503, 1).await;
    gateway.mock_anthropic_completion("configured").await;

    let dir = TempDir::new().unwrap();
    let path = write_settings(
        &dir,
        "gateway.toml",
        &format!(
            r#"
account_id = "{TEST_ACCOUNT}"
gateway = "{TEST_GATEWAY}"
api_key = "{TEST_API_KEY}"
base_url = "{}"

[defaults]
cache_ttl = "5m"
request_timeout = "2s"

[defaults.retries]
max_attempts = 2
retry_delay = "50ms"
backoff = "exponential"
"#,
            gateway.url()
        ),
    );

    let settings = ProviderSettings::load(&path).await.unwrap();
    let (identity, defaults) = settings.into_parts().unwrap();
    assert_eq!(defaults.cache_ttl_seconds, Some(300));
    assert_eq!(defaults.request_timeout_ms, Some(2000));
    let policy = defaults.retry_policy.unwrap();
    assert_eq!(policy.max_attempts(), 2);
    assert_eq!(policy.backoff(), Backoff::Exponential);

    let model = create_provider(identity, Some(defaults))
        .unwrap()
        .model(anthropic_candidate())
        .unwrap();
    let response = model
        .dispatch(&simple_prompt(), InvokeMode::Complete)
        .await
        .unwrap();

    assert_eq!(response.attempts.len(), 2);
    assert_eq!(response.content.collect_text().await.unwrap(), "configured");

    let bodies = gateway.bodies().await;
    assert_eq!(bodies[0]["cache_ttl"], 300);
    assert_eq!(bodies[0]["request_timeout_ms"], 2000);
}

/// Test a YAML settings file with an environment placeholder
#[tokio::test]
async fn test_yaml_settings_with_env_key() {
    std::env::set_var("INTEGRATION_GATEWAY_KEY", TEST_API_KEY);

    let dir = TempDir::new().unwrap();
    let path = write_settings(
        &dir,
        "gateway.yaml",
        &format!(
            "account_id: {TEST_ACCOUNT}\ngateway: {TEST_GATEWAY}\napi_key: ${{INTEGRATION_GATEWAY_KEY}}\ndefaults:\n  skip_cache: true\n"
        ),
    );

    let (identity, defaults) = ProviderSettings::load(&path)
        .await
        .unwrap()
        .into_parts()
        .unwrap();
    assert_eq!(identity.api_key(), Some(TEST_API_KEY));
    assert_eq!(defaults.skip_cache, Some(true));
}

/// Test an unset placeholder is reported by name
#[tokio::test]
async fn test_missing_env_placeholder() {
    let dir = TempDir::new().unwrap();
    let path = write_settings(
        &dir,
        "gateway.json",
        r#"{"account_id": "acct", "gateway": "prod", "api_key": "${INTEGRATION_UNSET_VARIABLE}"}"#,
    );

    let err = ProviderSettings::load(&path).await.unwrap_err();
    assert!(matches!(err, ConfigError::MissingEnv { ref var } if var == "INTEGRATION_UNSET_VARIABLE"));
}

/// Test out-of-range retry settings are rejected and convert to a configuration error
#[tokio::test]
async fn test_invalid_retry_settings() {
    let dir = TempDir::new().unwrap();
    let path = write_settings(
        &dir,
        "gateway.toml",
        "account_id = \"acct\"\ngateway = \"prod\"\napi_key = \"k\"\n\n[defaults.retries]\nmax_attempts = 6\n",
    );

    let err = ProviderSettings::load(&path).await.unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));

    let err: GatewayError = err.into();
    assert!(matches!(err, GatewayError::Configuration { .. }));
}
