//! Dispatch state machine.
//!
//! ```text
//! Pending{i} ──ok──────────────────────────────▶ Succeeded
//!     │ retryable, a < max ──▶ Retrying{i, a+1} ─┘ (same rules)
//!     │ non-retryable or retries spent ──▶ Pending{i+1} | ExhaustedAllCandidates
//!     └ fatal ──▶ Aborted
//! ```
//!
//! Transitions are computed by [`DispatchState::advance`], which does no I/O.

use crate::attempt::AttemptOutcome;
use gateway_core::FailureClass;
use gateway_resilience::RetryPolicy;

/// Where a dispatch currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    /// First attempt of a candidate is due
    Pending {
        /// Candidate index
        candidate: usize,
    },
    /// A retry of the same candidate is due
    Retrying {
        /// Candidate index
        candidate: usize,
        /// Attempt number about to be made (2 or more)
        attempt: u32,
    },
    /// A candidate produced a response
    Succeeded,
    /// Every candidate failed
    ExhaustedAllCandidates,
    /// A fatal failure ended the dispatch
    Aborted,
}

impl DispatchState {
    /// Initial state
    pub fn start() -> Self {
        Self::Pending { candidate: 0 }
    }

    /// Candidate index and attempt number due next, `None` once terminal
    pub fn position(self) -> Option<(usize, u32)> {
        match self {
            Self::Pending { candidate } => Some((candidate, 1)),
            Self::Retrying { candidate, attempt } => Some((candidate, attempt)),
            Self::Succeeded | Self::ExhaustedAllCandidates | Self::Aborted => None,
        }
    }

    /// Check whether no further attempt will be made
    pub fn is_terminal(self) -> bool {
        self.position().is_none()
    }

    /// Next state after the due attempt ended with `outcome`
    ///
    /// Terminal states are returned unchanged.
    #[must_use]
    pub fn advance(
        self,
        outcome: &AttemptOutcome,
        policy: &RetryPolicy,
        candidate_count: usize,
    ) -> Self {
        let Some((candidate, attempt)) = self.position() else {
            return self;
        };

        match outcome.failure_class() {
            None => Self::Succeeded,
            Some(FailureClass::Fatal) => Self::Aborted,
            Some(FailureClass::Retryable) if policy.allows_retry_after(attempt) => {
                Self::Retrying {
                    candidate,
                    attempt: attempt + 1,
                }
            }
            Some(FailureClass::Retryable | FailureClass::NonRetryable) => {
                if candidate + 1 < candidate_count {
                    Self::Pending {
                        candidate: candidate + 1,
                    }
                } else {
                    Self::ExhaustedAllCandidates
                }
            }
        }
    }
}
