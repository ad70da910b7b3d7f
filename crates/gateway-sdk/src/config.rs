//! HTTP transport configuration.

use std::time::Duration;

/// Configuration for the HTTP gateway transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Connection timeout duration.
    pub(crate) connect_timeout: Duration,
    /// How long idle pooled connections are kept.
    pub(crate) pool_idle_timeout: Duration,
    /// User agent string.
    pub(crate) user_agent: String,
    /// Custom headers to include in every request.
    pub(crate) custom_headers: Vec<(String, String)>,
}

impl TransportConfig {
    /// Default connection timeout (10 seconds).
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
    /// Default idle connection lifetime (90 seconds).
    pub const DEFAULT_POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
    /// Default user agent.
    pub const DEFAULT_USER_AGENT: &'static str =
        concat!("ai-gateway-fallback-rust/", env!("CARGO_PKG_VERSION"));

    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self {
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
            pool_idle_timeout: Self::DEFAULT_POOL_IDLE_TIMEOUT,
            user_agent: Self::DEFAULT_USER_AGENT.to_string(),
            custom_headers: Vec::new(),
        }
    }

    /// Set the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the idle connection lifetime.
    #[must_use]
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = timeout;
        self
    }

    /// Set the user agent.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Add a header sent with every request.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_headers.push((name.into(), value.into()));
        self
    }

    /// Get the connection timeout.
    pub fn get_connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Get the user agent.
    pub fn get_user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Get custom headers.
    pub fn custom_headers(&self) -> &[(String, String)] {
        &self.custom_headers
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::new()
    }
}
