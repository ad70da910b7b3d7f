//! Gateway envelope builder.
//!
//! Wraps one candidate's backend request in the gateway's universal request
//! shape: `POST v1/{account}/{gateway}/{provider}` with the backend payload
//! under `query` and gateway directives alongside it.

use gateway_config::{GatewayIdentity, RequestOptions};
use gateway_core::{CandidateModel, Envelope, GatewayError, GatewayResult, Prompt};
use gateway_resilience::RetryPolicy;
use http::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use http::Method;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Header carrying the gateway API key
pub const AUTHORIZATION_HEADER: &str = "cf-aig-authorization";

#[derive(Serialize)]
struct EnvelopeBody<'a> {
    provider: &'a str,
    endpoint: &'a str,
    headers: &'a BTreeMap<String, String>,
    query: &'a Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    cache_key: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cache_ttl: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    skip_cache: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<&'a BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    collect_log: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    event_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_timeout_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retries: Option<RetryPolicy>,
}

/// Build the gateway envelope for one candidate
///
/// Performs no I/O.
///
/// # Errors
/// Returns a configuration error if the identity is incomplete for its
/// authentication mode, or if the backend cannot express the prompt
pub fn build_envelope(
    identity: &GatewayIdentity,
    candidate: &CandidateModel,
    prompt: &Prompt,
    streaming: bool,
    options: &RequestOptions,
) -> GatewayResult<Envelope> {
    identity.validate()?;
    prompt.validate()?;

    let backend = candidate.backend().prepare(prompt, streaming)?;
    let provider = candidate.provider().as_str();

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(key) = identity.api_key() {
        let mut value = HeaderValue::from_str(&format!("Bearer {key}"))
            .map_err(|_| GatewayError::configuration("API key contains invalid header characters"))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION_HEADER, value);
    }

    let body = EnvelopeBody {
        provider,
        endpoint: &backend.endpoint,
        headers: &backend.headers,
        query: &backend.payload,
        cache_key: options.cache_key.as_deref(),
        cache_ttl: options.cache_ttl_seconds,
        skip_cache: options.skip_cache,
        metadata: options.metadata.as_ref(),
        collect_log: options.collect_log,
        event_id: options.event_id.as_deref(),
        request_timeout_ms: options.request_timeout_ms,
        retries: options.retry_policy,
    };
    let body = serde_json::to_value(&body)
        .map_err(|e| GatewayError::configuration(format!("failed to encode envelope: {e}")))?;

    Ok(Envelope {
        method: Method::POST,
        path: format!(
            "v1/{}/{}/{provider}",
            identity.account_id(),
            identity.gateway_name()
        ),
        headers,
        body,
        streaming,
        timeout: options.request_timeout(),
    })
}
