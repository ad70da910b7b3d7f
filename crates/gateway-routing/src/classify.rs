//! Gateway reply classification.
//!
//! Turns a raw [`GatewayReply`] into either served content or a classified
//! [`GatewayError`]. Gateway-level failures (unknown gateway, rejected
//! credentials) are recognised by the error codes in the gateway's own error
//! body and reported as fatal.

use futures::StreamExt;
use gateway_core::{
    is_retryable_status, CandidateModel, GatewayError, GatewayMetadata, GatewayReply,
    GatewayResult, InvokeMode, ReplyBody, TextStream,
};
use http::header::CONTENT_TYPE;
use http::HeaderMap;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Gateway error code: the named gateway does not exist
pub const GATEWAY_NOT_FOUND_CODE: u32 = 2001;
/// Gateway error code: the gateway rejected the credentials
pub const GATEWAY_UNAUTHORIZED_CODE: u32 = 2009;

const EXCERPT_CHARS: usize = 256;

#[derive(Debug, Deserialize)]
struct GatewayErrorBody {
    #[serde(default)]
    success: Option<bool>,
    #[serde(alias = "errors")]
    error: Vec<GatewayErrorDetail>,
}

/// One entry of a gateway error body
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GatewayErrorDetail {
    /// Gateway error code
    pub code: u32,
    /// Human-readable message
    #[serde(default)]
    pub message: String,
}

/// Content and metadata of a successful reply
#[derive(Debug)]
pub struct ServedReply {
    /// Response text
    pub content: TextStream,
    /// Gateway metadata
    pub metadata: GatewayMetadata,
}

/// Extract the first gateway error from a reply body, if it is one
pub fn parse_gateway_error(body: &[u8]) -> Option<GatewayErrorDetail> {
    let parsed: GatewayErrorBody = serde_json::from_slice(body).ok()?;
    if parsed.success == Some(true) {
        return None;
    }
    parsed.error.into_iter().next()
}

/// Classify a reply from `candidate`
///
/// # Errors
/// Returns a fatal error for gateway-level failures, otherwise a candidate
/// error whose retryability follows the HTTP status
pub async fn classify_reply(
    reply: GatewayReply,
    candidate: &CandidateModel,
    mode: InvokeMode,
    gateway_name: &str,
) -> GatewayResult<ServedReply> {
    if reply.is_success() {
        return read_success(reply, candidate, mode).await;
    }

    let status = reply.status;
    let body = reply.body.collect().await.unwrap_or_else(|e| {
        warn!(status, error = %e, "Failed to read gateway error body");
        Default::default()
    });

    let detail = parse_gateway_error(&body);
    if let Some(detail) = &detail {
        debug!(status, code = detail.code, message = %detail.message, "Gateway error body");
        match detail.code {
            GATEWAY_UNAUTHORIZED_CODE => {
                return Err(GatewayError::authentication(detail.message.clone()))
            }
            GATEWAY_NOT_FOUND_CODE => return Err(GatewayError::gateway_not_found(gateway_name)),
            _ => {}
        }
    }

    let reason = detail.map_or_else(|| excerpt(&body), |d| d.message);
    let message = if reason.is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {reason}")
    };

    Err(GatewayError::candidate(
        candidate.provider().as_str(),
        candidate.model_id(),
        message,
        Some(status),
        is_retryable_status(status),
    ))
}

async fn read_success(
    reply: GatewayReply,
    candidate: &CandidateModel,
    mode: InvokeMode,
) -> GatewayResult<ServedReply> {
    let metadata = reply.metadata();
    let provider = candidate.provider().as_str();
    let model = candidate.model_id();

    if mode.is_streaming() && !is_json(&reply.headers) {
        let stream = match reply.body {
            ReplyBody::Streaming(stream) => stream,
            ReplyBody::Buffered(bytes) => futures::stream::once(async move { Ok(bytes) }).boxed(),
        };
        return Ok(ServedReply {
            content: TextStream::from_sse(stream, Arc::clone(candidate.backend())),
            metadata,
        });
    }

    let body = reply
        .body
        .collect()
        .await
        .map_err(|e| e.for_candidate(provider, model))?;

    let text = candidate
        .backend()
        .decode_completion(&body)
        .map_err(|e| match e {
            GatewayError::CandidateInvocation { .. } => e,
            other => GatewayError::candidate(
                provider,
                model,
                format!("malformed response: {other}"),
                Some(metadata.status),
                false,
            ),
        })?;

    Ok(ServedReply {
        content: TextStream::once(text),
        metadata,
    })
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

fn excerpt(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.chars().count() > EXCERPT_CHARS {
        let cut: String = text.chars().take(EXCERPT_CHARS).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}
