//! # Gateway Config
//!
//! Policy configuration for AI gateway fallback routing:
//! - Gateway identity (account, gateway name, authentication mode)
//! - Per-request options and the option merger
//! - Settings documents loaded from TOML, YAML or JSON

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod identity;
pub mod options;
pub mod settings;

// Re-export main types
pub use error::ConfigError;
pub use identity::{AuthKind, AuthMode, GatewayIdentity};
pub use options::{merge, RequestOptions, RequestOptionsBuilder};
pub use settings::{OptionSettings, ProviderSettings, RetrySettings, SettingsFormat};
