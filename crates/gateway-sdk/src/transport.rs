//! HTTP transport to the gateway.

use crate::config::TransportConfig;
use async_trait::async_trait;
use futures::StreamExt;
use gateway_core::transport::body_error;
use gateway_core::{Envelope, GatewayError, GatewayReply, GatewayResult, GatewayTransport, ReplyBody};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use std::fmt;
use tracing::{debug, instrument};
use url::Url;

/// Sends envelopes to the gateway over HTTPS
///
/// Buffered replies are read completely before `send` returns; streaming
/// replies are handed back as soon as the headers arrive.
#[derive(Clone)]
pub struct HttpTransport {
    /// HTTP client.
    http: reqwest::Client,
    /// Gateway endpoint, always ending in `/`.
    base_url: Url,
}

impl HttpTransport {
    /// Create a transport with default settings
    ///
    /// # Errors
    /// Returns a configuration error if the HTTP client cannot be built
    pub fn new(base_url: &Url) -> GatewayResult<Self> {
        Self::with_config(base_url, &TransportConfig::default())
    }

    /// Create a transport with custom settings
    ///
    /// # Errors
    /// Returns a configuration error for invalid headers or if the HTTP client
    /// cannot be built
    pub fn with_config(base_url: &Url, config: &TransportConfig) -> GatewayResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| GatewayError::configuration(format!("Invalid user agent: {e}")))?,
        );

        for (name, value) in &config.custom_headers {
            let header_name = HeaderName::try_from(name.as_str()).map_err(|e| {
                GatewayError::configuration(format!("Invalid header name '{name}': {e}"))
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|e| {
                GatewayError::configuration(format!("Invalid header value for '{name}': {e}"))
            })?;
            headers.insert(header_name, header_value);
        }

        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| GatewayError::configuration(format!("Failed to create HTTP client: {e}")))?;

        let mut base_url = base_url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self { http, base_url })
    }

    /// Gateway endpoint
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> GatewayResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| GatewayError::configuration(format!("Invalid URL path '{path}': {e}")))
    }
}

#[async_trait]
impl GatewayTransport for HttpTransport {
    #[instrument(skip(self, envelope), fields(path = %envelope.path, streaming = envelope.streaming))]
    async fn send(&self, envelope: Envelope) -> GatewayResult<GatewayReply> {
        let url = self.url(&envelope.path)?;
        debug!("Sending gateway request to {}", url);

        let mut request = self
            .http
            .request(envelope.method, url)
            .headers(envelope.headers)
            .json(&envelope.body);

        // A whole-request deadline would cut long streams short; the
        // dispatcher bounds the wait for headers instead.
        if !envelope.streaming {
            if let Some(timeout) = envelope.timeout {
                request = request.timeout(timeout);
            }
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        debug!(status, "Gateway response headers received");

        let success = response.status().is_success();
        let body = if envelope.streaming && success {
            ReplyBody::Streaming(
                response
                    .bytes_stream()
                    .map(|chunk| chunk.map_err(body_error))
                    .boxed(),
            )
        } else {
            ReplyBody::Buffered(response.bytes().await.map_err(map_reqwest_error)?)
        };

        Ok(GatewayReply {
            status,
            headers,
            body,
        })
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

/// Map a reqwest error to a gateway error.
fn map_reqwest_error(error: reqwest::Error) -> GatewayError {
    if error.is_timeout() {
        GatewayError::transport(format!("request timed out: {error}"), true)
    } else if error.is_connect() {
        GatewayError::transport(format!("connection failed: {error}"), true)
    } else if error.is_builder() {
        GatewayError::configuration(format!("invalid request: {error}"))
    } else if error.is_request() || error.is_body() {
        GatewayError::transport(error.to_string(), true)
    } else {
        GatewayError::transport(error.to_string(), false)
    }
}
