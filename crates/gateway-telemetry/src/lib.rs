//! # Gateway Telemetry
//!
//! Observability for AI gateway fallback routing.
//!
//! This crate provides:
//! - Subscriber setup with text or JSON output
//! - Optional OpenTelemetry span export
//! - Span macros for dispatches and candidate attempts

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod tracing_setup;

// Re-export main types
pub use tracing_setup::{init_tracing, shutdown_tracing, TracingConfig, TracingError};
