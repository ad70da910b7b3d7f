//! # Gateway Resilience
//!
//! Resilience patterns for gateway fallback routing:
//! - Retry policy with constant, linear or exponential backoff
//! - Per-attempt timeout management

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod retry;
pub mod timeout;

// Re-export main types
pub use retry::{Backoff, RetryPolicy, RetryPolicyBuilder};
pub use timeout::AttemptTimeout;
