//! Gateway identity.
//!
//! Identifies which gateway to talk to and how to authenticate. Shared
//! read-only across every request once a provider is created.

use gateway_core::{GatewayError, GatewayResult, GatewayTransport};
use once_cell::sync::Lazy;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::sync::Arc;
use url::Url;

/// How requests authenticate with the gateway
#[derive(Clone)]
pub enum AuthMode {
    /// Bearer API key sent with every request
    ApiKey(SecretString),
    /// Pre-authenticated handle provided by the hosting runtime
    Binding(Arc<dyn GatewayTransport>),
}

/// Authentication mode without its credential
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthKind {
    /// API key mode
    ApiKey,
    /// Binding mode
    Binding,
}

impl AuthMode {
    /// The mode without its credential
    pub fn kind(&self) -> AuthKind {
        match self {
            Self::ApiKey(_) => AuthKind::ApiKey,
            Self::Binding(_) => AuthKind::Binding,
        }
    }
}

impl fmt::Debug for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiKey(_) => f.write_str("ApiKey([REDACTED])"),
            Self::Binding(binding) => f.debug_tuple("Binding").field(binding).finish(),
        }
    }
}

/// Account, gateway and credentials
#[derive(Debug, Clone)]
pub struct GatewayIdentity {
    account_id: String,
    gateway_name: String,
    auth: AuthMode,
    base_url: Url,
}

impl GatewayIdentity {
    /// Default gateway endpoint
    pub const DEFAULT_BASE_URL: &'static str = "https://gateway.ai.cloudflare.com";

    /// Create an identity
    ///
    /// Nothing is validated here; [`GatewayIdentity::validate`] runs when a
    /// provider is created.
    pub fn new(
        account_id: impl Into<String>,
        gateway_name: impl Into<String>,
        auth: AuthMode,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            gateway_name: gateway_name.into(),
            auth,
            base_url: default_base_url(),
        }
    }

    /// Create an identity authenticating with an API key
    pub fn with_api_key(
        account_id: impl Into<String>,
        gateway_name: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self::new(
            account_id,
            gateway_name,
            AuthMode::ApiKey(SecretString::new(api_key.into())),
        )
    }

    /// Create an identity authenticating through a runtime binding
    pub fn with_binding(
        account_id: impl Into<String>,
        gateway_name: impl Into<String>,
        binding: Arc<dyn GatewayTransport>,
    ) -> Self {
        Self::new(account_id, gateway_name, AuthMode::Binding(binding))
    }

    /// Point at a different gateway endpoint
    #[must_use]
    pub fn base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    /// Point at a different gateway endpoint given as a string
    ///
    /// # Errors
    /// Returns a configuration error if the URL does not parse
    pub fn try_base_url(self, base_url: &str) -> GatewayResult<Self> {
        let url = Url::parse(base_url).map_err(|e| {
            GatewayError::configuration(format!("invalid gateway base URL '{base_url}': {e}"))
        })?;
        Ok(self.base_url(url))
    }

    /// Account identifier
    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    /// Gateway name
    pub fn gateway_name(&self) -> &str {
        &self.gateway_name
    }

    /// Authentication mode
    pub fn auth(&self) -> &AuthMode {
        &self.auth
    }

    /// Gateway endpoint
    pub fn gateway_url(&self) -> &Url {
        &self.base_url
    }

    /// API key, in API key mode
    pub fn api_key(&self) -> Option<&str> {
        match &self.auth {
            AuthMode::ApiKey(key) => Some(key.expose_secret().as_str()),
            AuthMode::Binding(_) => None,
        }
    }

    /// Binding handle, in binding mode
    pub fn binding(&self) -> Option<&Arc<dyn GatewayTransport>> {
        match &self.auth {
            AuthMode::Binding(binding) => Some(binding),
            AuthMode::ApiKey(_) => None,
        }
    }

    /// Check the identity is complete for its authentication mode
    ///
    /// # Errors
    /// Returns a configuration error describing the first problem found
    pub fn validate(&self) -> GatewayResult<()> {
        validate_segment("account id", &self.account_id)?;
        validate_segment("gateway name", &self.gateway_name)?;

        match &self.auth {
            AuthMode::ApiKey(key) => {
                if key.expose_secret().trim().is_empty() {
                    return Err(GatewayError::configuration(
                        "API key authentication requires a non-empty key",
                    ));
                }
            }
            AuthMode::Binding(binding) => {
                if !binding.is_live() {
                    return Err(GatewayError::configuration(
                        "binding authentication requires a live binding handle",
                    ));
                }
            }
        }

        if !matches!(self.base_url.scheme(), "http" | "https") {
            return Err(GatewayError::configuration(format!(
                "gateway base URL must be http(s), got '{}'",
                self.base_url
            )));
        }

        Ok(())
    }
}

#[allow(clippy::unwrap_used)]
static DEFAULT_BASE_URL: Lazy<Url> =
    Lazy::new(|| Url::parse(GatewayIdentity::DEFAULT_BASE_URL).unwrap());

fn default_base_url() -> Url {
    DEFAULT_BASE_URL.clone()
}

/// Path segments are embedded verbatim in the gateway URL.
fn validate_segment(what: &str, value: &str) -> GatewayResult<()> {
    if value.is_empty() {
        return Err(GatewayError::configuration(format!("{what} must not be empty")));
    }
    if !value
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    {
        return Err(GatewayError::configuration(format!(
            "{what} '{value}' may only contain ASCII letters, digits, '-' and '_'"
        )));
    }
    Ok(())
}
