//! # Gateway Routing
//!
//! Ordered fallback dispatch through an AI gateway.
//!
//! This crate provides:
//! - The gateway envelope builder
//! - Classification of gateway replies into success, retry, fallback or abort
//! - The dispatch state machine and its pure transition function
//! - The fallback dispatcher with per-attempt timeouts, backoff and cancellation

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod attempt;
pub mod classify;
pub mod dispatcher;
pub mod envelope;
pub mod response;
pub mod state;

#[cfg(test)]
mod testing;

// Re-export main types
pub use attempt::{AttemptOutcome, DispatchAttempt};
pub use dispatcher::FallbackDispatcher;
pub use envelope::{build_envelope, AUTHORIZATION_HEADER};
pub use response::{ResolvedResponse, ServedBy};
pub use state::DispatchState;
