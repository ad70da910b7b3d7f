//! Response of a resolved dispatch.

use crate::attempt::DispatchAttempt;
use gateway_core::{GatewayMetadata, ModelResponse, TextStream};
use std::fmt;
use uuid::Uuid;

/// Candidate that produced the response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServedBy {
    /// Position in the fallback list
    pub index: usize,
    /// Provider tag
    pub provider: String,
    /// Backend model identifier
    pub model_id: String,
}

impl fmt::Display for ServedBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}/{}", self.index, self.provider, self.model_id)
    }
}

/// Successful dispatch, owned by the caller
#[derive(Debug)]
pub struct ResolvedResponse {
    /// Identifier of this dispatch, also recorded on its tracing span
    pub dispatch_id: Uuid,
    /// Serving candidate
    pub served_by: ServedBy,
    /// Response text
    pub content: TextStream,
    /// Gateway metadata of the serving reply
    pub gateway_metadata: GatewayMetadata,
    /// Every attempt made, in order, ending with the successful one
    pub attempts: Vec<DispatchAttempt>,
}

impl ResolvedResponse {
    /// Attempts made against one candidate
    pub fn attempts_for(&self, index: usize) -> impl Iterator<Item = &DispatchAttempt> {
        self.attempts
            .iter()
            .filter(move |a| a.candidate_index == index)
    }

    /// Number of candidates that were tried
    pub fn candidates_tried(&self) -> usize {
        self.served_by.index + 1
    }

    /// Drop the dispatch details and keep the uniform response
    pub fn into_model_response(self) -> ModelResponse {
        ModelResponse {
            provider: self.served_by.provider,
            model_id: self.served_by.model_id,
            content: self.content,
            metadata: self.gateway_metadata,
        }
    }
}

impl From<ResolvedResponse> for ModelResponse {
    fn from(response: ResolvedResponse) -> Self {
        response.into_model_response()
    }
}
