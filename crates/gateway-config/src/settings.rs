//! Provider settings documents.
//!
//! A settings document describes one gateway identity plus default request
//! options. Documents may be TOML, YAML or JSON. `${VAR}` placeholders inside
//! string values are replaced with environment variables after parsing, so
//! comments are never resolved and substituted text is taken verbatim.
//!
//! ```toml
//! account_id = "acct-123"
//! gateway = "production"
//! api_key = "${GATEWAY_API_KEY}"
//!
//! [defaults]
//! cache_ttl = "5m"
//! request_timeout = "10s"
//!
//! [defaults.retries]
//! max_attempts = 3
//! retry_delay = "1s"
//! backoff = "exponential"
//! ```

use crate::error::ConfigError;
use crate::identity::GatewayIdentity;
use crate::options::RequestOptions;
use gateway_resilience::{Backoff, RetryPolicy};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;
use validator::Validate;

#[allow(clippy::unwrap_used)]
static ENV_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap());

/// Settings document format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsFormat {
    /// TOML
    Toml,
    /// YAML
    Yaml,
    /// JSON
    Json,
}

impl SettingsFormat {
    /// Infer the format from a file extension
    ///
    /// # Errors
    /// Returns an error for missing or unknown extensions
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("yaml" | "yml") => Ok(Self::Yaml),
            Some("json") => Ok(Self::Json),
            other => Err(ConfigError::invalid(format!(
                "unsupported settings file extension {other:?} for {}",
                path.display()
            ))),
        }
    }

    /// Format name
    pub fn name(self) -> &'static str {
        match self {
            Self::Toml => "TOML",
            Self::Yaml => "YAML",
            Self::Json => "JSON",
        }
    }
}

/// Retry settings with human-readable delays
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct RetrySettings {
    /// Attempts per candidate, including the first
    #[validate(range(min = 1, max = 5))]
    pub max_attempts: u32,

    /// Base delay between attempts (e.g. `500ms`)
    #[serde(default, with = "humantime_serde")]
    pub retry_delay: Duration,

    /// Backoff curve
    #[serde(default)]
    pub backoff: Backoff,
}

/// Default request options with human-readable durations
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct OptionSettings {
    /// Explicit cache key
    pub cache_key: Option<String>,

    /// Cache lifetime (e.g. `5m`)
    #[serde(with = "humantime_serde")]
    pub cache_ttl: Option<Duration>,

    /// Bypass the cache
    pub skip_cache: Option<bool>,

    /// Log metadata
    pub metadata: Option<BTreeMap<String, String>>,

    /// Whether the gateway stores a log entry
    pub collect_log: Option<bool>,

    /// Event identifier
    pub event_id: Option<String>,

    /// Per-attempt time budget (e.g. `10s`)
    #[serde(with = "humantime_serde")]
    pub request_timeout: Option<Duration>,

    /// Retry policy
    #[validate(nested)]
    pub retries: Option<RetrySettings>,
}

impl OptionSettings {
    /// Convert into request options
    ///
    /// # Errors
    /// Returns an error if the retry settings are out of range
    pub fn to_options(&self) -> Result<RequestOptions, ConfigError> {
        let retry_policy = self
            .retries
            .as_ref()
            .map(|r| {
                RetryPolicy::new(
                    r.max_attempts,
                    u64::try_from(r.retry_delay.as_millis()).unwrap_or(u64::MAX),
                    r.backoff,
                )
            })
            .transpose()?;

        Ok(RequestOptions {
            cache_key: self.cache_key.clone(),
            cache_ttl_seconds: self.cache_ttl.map(|ttl| ttl.as_secs()),
            skip_cache: self.skip_cache,
            metadata: self.metadata.clone(),
            collect_log: self.collect_log,
            event_id: self.event_id.clone(),
            request_timeout_ms: self
                .request_timeout
                .map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX)),
            retry_policy,
        })
    }
}

/// One gateway identity and its default options
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ProviderSettings {
    /// Account identifier
    #[validate(length(min = 1, max = 128))]
    pub account_id: String,

    /// Gateway name
    #[validate(length(min = 1, max = 128))]
    pub gateway: String,

    /// Gateway API key; required unless a binding is supplied in code
    #[serde(default)]
    pub api_key: Option<SecretString>,

    /// Gateway endpoint override
    #[serde(default)]
    #[validate(url)]
    pub base_url: Option<String>,

    /// Default request options
    #[serde(default)]
    #[validate(nested)]
    pub defaults: OptionSettings,
}

impl ProviderSettings {
    /// Load settings from a file, choosing the format by extension
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed or validated
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = SettingsFormat::from_path(path)?;
        debug!(path = %path.display(), format = format.name(), "Loading provider settings");

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let settings = Self::parse(&content, format)?;
        info!(
            account_id = %settings.account_id,
            gateway = %settings.gateway,
            "Loaded provider settings"
        );
        Ok(settings)
    }

    /// Parse settings from a string
    ///
    /// # Errors
    /// Returns an error if a placeholder is unset or the document is invalid
    pub fn parse(content: &str, format: SettingsFormat) -> Result<Self, ConfigError> {
        let parse_error = |message: String| ConfigError::Parse {
            format: format.name(),
            message,
        };

        let mut document: Value = match format {
            SettingsFormat::Toml => toml::from_str(content).map_err(|e| parse_error(e.to_string()))?,
            SettingsFormat::Yaml => {
                serde_yaml::from_str(content).map_err(|e| parse_error(e.to_string()))?
            }
            SettingsFormat::Json => {
                serde_json::from_str(content).map_err(|e| parse_error(e.to_string()))?
            }
        };
        resolve_env(&mut document)?;

        let settings: Self =
            serde_json::from_value(document).map_err(|e| parse_error(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Split into a gateway identity and default request options
    ///
    /// The identity uses API key authentication. Callers using a runtime
    /// binding build the identity themselves and use
    /// [`OptionSettings::to_options`].
    ///
    /// # Errors
    /// Returns an error if no API key is configured or a value is unusable
    pub fn into_parts(self) -> Result<(GatewayIdentity, RequestOptions), ConfigError> {
        let options = self.defaults.to_options()?;

        let api_key = self
            .api_key
            .as_ref()
            .map(|k| k.expose_secret().clone())
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConfigError::invalid("api_key is required"))?;

        let mut identity = GatewayIdentity::with_api_key(self.account_id, self.gateway, api_key);
        if let Some(base_url) = self.base_url.as_deref() {
            let url = Url::parse(base_url)
                .map_err(|e| ConfigError::invalid(format!("invalid base_url '{base_url}': {e}")))?;
            identity = identity.base_url(url);
        }

        identity.validate()?;
        Ok((identity, options))
    }
}

/// Resolve placeholders in every string value of a parsed document
fn resolve_env(value: &mut Value) -> Result<(), ConfigError> {
    match value {
        Value::String(text) if ENV_PLACEHOLDER.is_match(text) => {
            *text = substitute(text)?;
        }
        Value::Array(items) => items.iter_mut().try_for_each(resolve_env)?,
        Value::Object(fields) => fields.values_mut().try_for_each(resolve_env)?,
        _ => {}
    }
    Ok(())
}

/// Replace every `${VAR}` in `text` with the variable's value
fn substitute(text: &str) -> Result<String, ConfigError> {
    let mut missing = None;
    let resolved = ENV_PLACEHOLDER.replace_all(text, |caps: &Captures<'_>| {
        let var = &caps[1];
        std::env::var(var).unwrap_or_else(|_| {
            missing.get_or_insert_with(|| var.to_string());
            String::new()
        })
    });

    match missing {
        Some(var) => Err(ConfigError::MissingEnv { var }),
        None => Ok(resolved.into_owned()),
    }
}
