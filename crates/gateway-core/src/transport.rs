//! Gateway transport seam.
//!
//! The dispatcher hands a fully-formed [`Envelope`] to a [`GatewayTransport`]
//! and receives a [`GatewayReply`]. HTTP clients and runtime bindings are both
//! just implementations of the trait.

use crate::error::{GatewayError, GatewayResult};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::stream::BoxStream;
use futures_util::StreamExt;
use http::{HeaderMap, Method};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Prefix of gateway-specific response headers
pub const GATEWAY_HEADER_PREFIX: &str = "cf-aig-";

/// A request ready to be sent to the gateway
#[derive(Debug, Clone)]
pub struct Envelope {
    /// HTTP method
    pub method: Method,
    /// Path relative to the gateway base URL
    pub path: String,
    /// Request headers, including gateway authentication in API key mode
    pub headers: HeaderMap,
    /// JSON body: backend payload plus gateway directives
    pub body: Value,
    /// Whether an incremental response was requested
    pub streaming: bool,
    /// Time budget for this attempt
    pub timeout: Option<Duration>,
}

/// Reply body as delivered by the transport
pub enum ReplyBody {
    /// Fully received body
    Buffered(Bytes),
    /// Incremental body; dropping it releases the underlying connection
    Streaming(BoxStream<'static, GatewayResult<Bytes>>),
}

impl ReplyBody {
    /// Read the whole body into memory
    ///
    /// # Errors
    /// Returns the first error reported by a streaming body
    pub async fn collect(self) -> GatewayResult<Bytes> {
        match self {
            Self::Buffered(bytes) => Ok(bytes),
            Self::Streaming(mut stream) => {
                let mut buffer = BytesMut::new();
                while let Some(chunk) = stream.next().await {
                    buffer.extend_from_slice(&chunk?);
                }
                Ok(buffer.freeze())
            }
        }
    }
}

impl fmt::Debug for ReplyBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buffered(bytes) => f.debug_tuple("Buffered").field(&bytes.len()).finish(),
            Self::Streaming(_) => f.write_str("Streaming(..)"),
        }
    }
}

/// Reply received from the gateway
#[derive(Debug)]
pub struct GatewayReply {
    /// HTTP status
    pub status: u16,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body
    pub body: ReplyBody,
}

impl GatewayReply {
    /// Create a buffered reply
    pub fn buffered(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: ReplyBody::Buffered(body.into()),
        }
    }

    /// Check for a 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Gateway metadata carried by this reply
    pub fn metadata(&self) -> GatewayMetadata {
        GatewayMetadata::from_headers(self.status, &self.headers)
    }
}

/// Metadata the gateway reports about a served request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatewayMetadata {
    /// HTTP status of the serving reply
    pub status: u16,
    /// `cf-aig-*` response headers, keyed by lowercase name
    pub headers: BTreeMap<String, String>,
}

impl GatewayMetadata {
    /// Collect gateway headers from a response
    pub fn from_headers(status: u16, headers: &HeaderMap) -> Self {
        let headers = headers
            .iter()
            .filter(|(name, _)| name.as_str().starts_with(GATEWAY_HEADER_PREFIX))
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        Self { status, headers }
    }

    /// Look up a gateway header by its suffix (e.g. `cache-status`)
    pub fn get(&self, suffix: &str) -> Option<&str> {
        self.headers
            .get(&format!("{GATEWAY_HEADER_PREFIX}{suffix}"))
            .map(String::as_str)
    }

    /// Cache status reported by the gateway (`HIT`, `MISS`, ...)
    pub fn cache_status(&self) -> Option<&str> {
        self.get("cache-status")
    }

    /// Gateway log identifier
    pub fn log_id(&self) -> Option<&str> {
        self.get("log-id")
    }
}

/// Something that can deliver envelopes to the gateway
#[async_trait]
pub trait GatewayTransport: Send + Sync + fmt::Debug {
    /// Send one envelope and wait for the reply headers
    ///
    /// # Errors
    /// Returns `Transport` or `Timeout` errors for delivery failures
    async fn send(&self, envelope: Envelope) -> GatewayResult<GatewayReply>;

    /// Whether the handle can currently carry requests
    fn is_live(&self) -> bool {
        true
    }
}

/// Convert a delivery failure for a body chunk into a stream error
pub fn body_error(message: impl fmt::Display) -> GatewayError {
    GatewayError::streaming(format!("body read failed: {message}"))
}
