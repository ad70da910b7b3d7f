//! Fallback dispatcher.
//!
//! Walks the candidate list strictly in order, one attempt at a time. Each
//! attempt is bounded by the per-attempt timeout; retryable failures are
//! retried on the same candidate with backoff until the retry policy is
//! spent, then the next candidate is tried. Fatal failures end the dispatch
//! immediately.

use crate::attempt::{AttemptOutcome, DispatchAttempt};
use crate::classify::{classify_reply, ServedReply};
use crate::envelope::build_envelope;
use crate::response::{ResolvedResponse, ServedBy};
use crate::state::DispatchState;
use gateway_config::{GatewayIdentity, RequestOptions};
use gateway_core::{
    CandidateFailure, CandidateModel, GatewayError, GatewayResult, GatewayTransport, InvokeMode,
    Prompt,
};
use gateway_telemetry::{attempt_span, dispatch_span};
use std::fmt;
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

/// Dispatches prompts across an ordered list of candidates
///
/// Cheap to clone; identity, candidates and transport are shared read-only.
#[derive(Clone)]
pub struct FallbackDispatcher {
    identity: Arc<GatewayIdentity>,
    candidates: Arc<[CandidateModel]>,
    transport: Arc<dyn GatewayTransport>,
}

impl FallbackDispatcher {
    /// Create a dispatcher
    ///
    /// # Errors
    /// Returns a configuration error if `candidates` is empty
    pub fn new(
        identity: Arc<GatewayIdentity>,
        candidates: Vec<CandidateModel>,
        transport: Arc<dyn GatewayTransport>,
    ) -> GatewayResult<Self> {
        if candidates.is_empty() {
            return Err(GatewayError::configuration(
                "fallback list must contain at least one candidate",
            ));
        }

        Ok(Self {
            identity,
            candidates: candidates.into(),
            transport,
        })
    }

    /// Candidates in priority order
    pub fn candidates(&self) -> &[CandidateModel] {
        &self.candidates
    }

    /// Highest-priority candidate
    pub fn primary(&self) -> &CandidateModel {
        &self.candidates[0]
    }

    /// Gateway identity
    pub fn identity(&self) -> &GatewayIdentity {
        &self.identity
    }

    /// Resolve `prompt` against the candidate list
    ///
    /// Dropping the returned future abandons the in-flight attempt.
    ///
    /// # Errors
    /// Returns `AllCandidatesFailed` when every candidate failed, or the
    /// first fatal error encountered
    pub async fn dispatch(
        &self,
        prompt: &Prompt,
        mode: InvokeMode,
        options: &RequestOptions,
    ) -> GatewayResult<ResolvedResponse> {
        let dispatch_id = Uuid::new_v4();
        let span = dispatch_span!(dispatch_id, self.candidates.len(), mode.is_streaming());
        self.run(dispatch_id, prompt, mode, options)
            .instrument(span)
            .await
    }

    /// Resolve `prompt`, giving up with `Cancelled` once `cancel` fires
    ///
    /// # Errors
    /// As [`FallbackDispatcher::dispatch`], plus `Cancelled`
    pub async fn dispatch_with_cancellation(
        &self,
        prompt: &Prompt,
        mode: InvokeMode,
        options: &RequestOptions,
        cancel: &CancellationToken,
    ) -> GatewayResult<ResolvedResponse> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                info!("Dispatch cancelled by caller");
                Err(GatewayError::Cancelled)
            }
            result = self.dispatch(prompt, mode, options) => result,
        }
    }

    async fn run(
        &self,
        dispatch_id: Uuid,
        prompt: &Prompt,
        mode: InvokeMode,
        options: &RequestOptions,
    ) -> GatewayResult<ResolvedResponse> {
        let policy = options.effective_retry_policy();
        let timeout = options.attempt_timeout();
        let count = self.candidates.len();

        let mut state = DispatchState::start();
        let mut attempts = Vec::new();
        let mut failures = Vec::with_capacity(count);

        while let Some((index, attempt)) = state.position() {
            let candidate = &self.candidates[index];
            let provider = candidate.provider().as_str();
            let model = candidate.model_id();

            let started = Instant::now();
            let result = timeout
                .run(self.attempt(candidate, prompt, mode, options))
                .instrument(attempt_span!(index, provider, model, attempt))
                .await;
            let elapsed = started.elapsed();

            let error = match result {
                Ok(ServedReply { content, metadata }) => {
                    attempts.push(DispatchAttempt {
                        candidate_index: index,
                        attempt,
                        provider: provider.to_string(),
                        model_id: model.to_string(),
                        outcome: AttemptOutcome::Succeeded,
                        elapsed,
                    });
                    let served_by = ServedBy {
                        index,
                        provider: provider.to_string(),
                        model_id: model.to_string(),
                    };
                    tracing::Span::current().record("served_by", tracing::field::display(&served_by));
                    info!(
                        candidate = index,
                        provider,
                        model,
                        attempt,
                        elapsed_ms = elapsed.as_millis() as u64,
                        cache_status = metadata.cache_status().unwrap_or("none"),
                        "Dispatch succeeded"
                    );
                    return Ok(ResolvedResponse {
                        dispatch_id,
                        served_by,
                        content,
                        gateway_metadata: metadata,
                        attempts,
                    });
                }
                Err(error) => error.for_candidate(provider, model),
            };

            let outcome = AttemptOutcome::from_error(&error);
            attempts.push(DispatchAttempt {
                candidate_index: index,
                attempt,
                provider: provider.to_string(),
                model_id: model.to_string(),
                outcome: outcome.clone(),
                elapsed,
            });

            let next = state.advance(&outcome, &policy, count);
            match next {
                DispatchState::Retrying { .. } => {
                    let delay = policy.delay_for_attempt(attempt);
                    warn!(
                        candidate = index,
                        provider,
                        model,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Attempt failed, retrying candidate"
                    );
                    tokio::time::sleep(delay).await;
                }
                DispatchState::Pending { .. } | DispatchState::ExhaustedAllCandidates => {
                    warn!(
                        candidate = index,
                        provider,
                        model,
                        attempts = attempt,
                        error = %error,
                        "Candidate failed, falling back"
                    );
                    failures.push(CandidateFailure {
                        index,
                        provider: provider.to_string(),
                        model: model.to_string(),
                        attempts: attempt,
                        error,
                    });
                }
                DispatchState::Aborted | DispatchState::Succeeded => {
                    error!(
                        candidate = index,
                        provider,
                        model,
                        error = %error,
                        "Dispatch aborted"
                    );
                    return Err(error);
                }
            }
            state = next;
        }

        error!(candidates = count, "All candidates failed");
        Err(GatewayError::AllCandidatesFailed { failures })
    }

    async fn attempt(
        &self,
        candidate: &CandidateModel,
        prompt: &Prompt,
        mode: InvokeMode,
        options: &RequestOptions,
    ) -> GatewayResult<ServedReply> {
        let envelope =
            build_envelope(&self.identity, candidate, prompt, mode.is_streaming(), options)?;
        debug!(path = %envelope.path, streaming = envelope.streaming, "Sending envelope");

        let reply = self.transport.send(envelope).await?;
        debug!(status = reply.status, "Gateway replied");

        classify_reply(reply, candidate, mode, self.identity.gateway_name()).await
    }
}

impl fmt::Debug for FallbackDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let candidates: Vec<String> = self.candidates.iter().map(ToString::to_string).collect();
        f.debug_struct("FallbackDispatcher")
            .field("account_id", &self.identity.account_id())
            .field("gateway", &self.identity.gateway_name())
            .field("candidates", &candidates)
            .finish_non_exhaustive()
    }
}
