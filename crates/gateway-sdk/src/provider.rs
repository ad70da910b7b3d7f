//! Provider handles and fallback models.

use crate::config::TransportConfig;
use crate::transport::HttpTransport;
use async_trait::async_trait;
use gateway_config::{GatewayIdentity, RequestOptions};
use gateway_core::{
    CandidateModel, ChatMessage, GatewayResult, GatewayTransport, InvokeMode, LanguageModel,
    ModelResponse, Prompt, TextStream,
};
use gateway_routing::{FallbackDispatcher, ResolvedResponse};
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

/// Create a provider handle for a gateway
///
/// The identity is validated here, before any network activity. In binding
/// mode requests travel through the binding; otherwise an HTTP transport is
/// created for the identity's gateway endpoint.
///
/// # Errors
/// Returns a configuration error if the identity is incomplete
pub fn create_provider(
    identity: GatewayIdentity,
    defaults: Option<RequestOptions>,
) -> GatewayResult<ProviderHandle> {
    create_provider_with_config(identity, defaults, &TransportConfig::default())
}

/// Create a provider handle with custom HTTP transport settings
///
/// The settings are ignored in binding mode.
///
/// # Errors
/// Returns a configuration error if the identity is incomplete or the HTTP
/// client cannot be built
pub fn create_provider_with_config(
    identity: GatewayIdentity,
    defaults: Option<RequestOptions>,
    config: &TransportConfig,
) -> GatewayResult<ProviderHandle> {
    identity.validate()?;

    let transport: Arc<dyn GatewayTransport> = match identity.binding() {
        Some(binding) => Arc::clone(binding),
        None => Arc::new(HttpTransport::with_config(identity.gateway_url(), config)?),
    };

    Ok(ProviderHandle::assemble(identity, defaults, transport))
}

/// Create a provider handle that sends through `transport`
///
/// # Errors
/// Returns a configuration error if the identity is incomplete
pub fn create_provider_with_transport(
    identity: GatewayIdentity,
    defaults: Option<RequestOptions>,
    transport: Arc<dyn GatewayTransport>,
) -> GatewayResult<ProviderHandle> {
    identity.validate()?;
    Ok(ProviderHandle::assemble(identity, defaults, transport))
}

/// Validated gateway identity plus default request options
///
/// Cheap to clone; every model created from it shares its transport.
#[derive(Clone)]
pub struct ProviderHandle {
    identity: Arc<GatewayIdentity>,
    defaults: RequestOptions,
    transport: Arc<dyn GatewayTransport>,
}

impl ProviderHandle {
    fn assemble(
        identity: GatewayIdentity,
        defaults: Option<RequestOptions>,
        transport: Arc<dyn GatewayTransport>,
    ) -> Self {
        debug!(
            account = identity.account_id(),
            gateway = identity.gateway_name(),
            auth = ?identity.auth().kind(),
            "Gateway provider created"
        );
        Self {
            identity: Arc::new(identity),
            defaults: defaults.unwrap_or_default(),
            transport,
        }
    }

    /// Gateway identity
    pub fn identity(&self) -> &GatewayIdentity {
        &self.identity
    }

    /// Default request options
    pub fn defaults(&self) -> &RequestOptions {
        &self.defaults
    }

    /// Build a model that tries `candidates` in order
    ///
    /// `options` are layered on top of the provider defaults.
    ///
    /// # Errors
    /// Returns a configuration error if `candidates` is empty
    pub fn fallback(
        &self,
        candidates: Vec<CandidateModel>,
        options: Option<RequestOptions>,
    ) -> GatewayResult<FallbackModel> {
        let dispatcher = FallbackDispatcher::new(
            Arc::clone(&self.identity),
            candidates,
            Arc::clone(&self.transport),
        )?;
        let options = match options {
            Some(overrides) => self.defaults.merged_with(&overrides),
            None => self.defaults.clone(),
        };
        Ok(FallbackModel {
            dispatcher,
            options,
        })
    }

    /// Wrap a single backend model for the gateway
    ///
    /// # Errors
    /// Never fails for a single candidate; kept fallible to match
    /// [`ProviderHandle::fallback`]
    pub fn model(&self, candidate: CandidateModel) -> GatewayResult<FallbackModel> {
        self.fallback(vec![candidate], None)
    }
}

impl fmt::Debug for ProviderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderHandle")
            .field("identity", &self.identity)
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

/// Ordered list of backend models presented as one model
#[derive(Clone)]
pub struct FallbackModel {
    dispatcher: FallbackDispatcher,
    options: RequestOptions,
}

impl FallbackModel {
    /// Candidates in priority order
    pub fn candidates(&self) -> &[CandidateModel] {
        self.dispatcher.candidates()
    }

    /// Options applied to every call
    pub fn options(&self) -> &RequestOptions {
        &self.options
    }

    /// Run a dispatch and keep its full details
    ///
    /// # Errors
    /// Returns `AllCandidatesFailed` when every candidate failed, or the
    /// first fatal error
    pub async fn dispatch(&self, prompt: &Prompt, mode: InvokeMode) -> GatewayResult<ResolvedResponse> {
        self.dispatcher.dispatch(prompt, mode, &self.options).await
    }

    /// Run a dispatch with extra options layered on top of this model's
    ///
    /// # Errors
    /// As [`FallbackModel::dispatch`]
    pub async fn dispatch_with_options(
        &self,
        prompt: &Prompt,
        mode: InvokeMode,
        overrides: &RequestOptions,
    ) -> GatewayResult<ResolvedResponse> {
        let options = self.options.merged_with(overrides);
        self.dispatcher.dispatch(prompt, mode, &options).await
    }

    /// Invoke, giving up with `Cancelled` once `cancel` fires
    ///
    /// # Errors
    /// As [`FallbackModel::dispatch`], plus `Cancelled`
    pub async fn invoke_with_cancellation(
        &self,
        prompt: &Prompt,
        mode: InvokeMode,
        cancel: &CancellationToken,
    ) -> GatewayResult<ModelResponse> {
        self.dispatcher
            .dispatch_with_cancellation(prompt, mode, &self.options, cancel)
            .await
            .map(ResolvedResponse::into_model_response)
    }

    /// Complete `prompt` and return the whole text
    ///
    /// # Errors
    /// As [`FallbackModel::dispatch`]
    pub async fn generate_text(&self, prompt: &Prompt) -> GatewayResult<String> {
        let response = self.dispatch(prompt, InvokeMode::Complete).await?;
        response.content.collect_text().await
    }

    /// Stream the completion of `prompt`
    ///
    /// # Errors
    /// As [`FallbackModel::dispatch`]; failures after the stream is returned
    /// surface as stream items
    pub async fn stream_text(&self, prompt: &Prompt) -> GatewayResult<TextStream> {
        Ok(self.dispatch(prompt, InvokeMode::Stream).await?.content)
    }

    /// Start building a chat request
    pub fn chat(&self) -> ChatBuilder {
        ChatBuilder::new(self.clone())
    }
}

#[async_trait]
impl LanguageModel for FallbackModel {
    fn provider(&self) -> &str {
        self.dispatcher.primary().provider().as_str()
    }

    fn model_id(&self) -> &str {
        self.dispatcher.primary().model_id()
    }

    #[instrument(skip(self, prompt), fields(primary = %self.dispatcher.primary()))]
    async fn invoke(&self, prompt: &Prompt, mode: InvokeMode) -> GatewayResult<ModelResponse> {
        self.dispatch(prompt, mode)
            .await
            .map(ResolvedResponse::into_model_response)
    }
}

impl fmt::Debug for FallbackModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FallbackModel")
            .field("candidates", &self.candidates())
            .field("options", &self.options)
            .finish()
    }
}

/// Builder for chat requests against a [`FallbackModel`]
#[derive(Debug)]
pub struct ChatBuilder {
    model: FallbackModel,
    prompt: Prompt,
    overrides: RequestOptions,
}

impl ChatBuilder {
    fn new(model: FallbackModel) -> Self {
        Self {
            model,
            prompt: Prompt::new(),
            overrides: RequestOptions::default(),
        }
    }

    /// Add a message
    #[must_use]
    pub fn message(mut self, message: ChatMessage) -> Self {
        self.prompt = self.prompt.message(message);
        self
    }

    /// Add a system message
    #[must_use]
    pub fn system_message(mut self, content: impl Into<String>) -> Self {
        self.prompt = self.prompt.system_message(content);
        self
    }

    /// Add a user message
    #[must_use]
    pub fn user_message(mut self, content: impl Into<String>) -> Self {
        self.prompt = self.prompt.user_message(content);
        self
    }

    /// Add an assistant message
    #[must_use]
    pub fn assistant_message(mut self, content: impl Into<String>) -> Self {
        self.prompt = self.prompt.assistant_message(content);
        self
    }

    /// Set the temperature
    #[must_use]
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.prompt = self.prompt.temperature(temperature);
        self
    }

    /// Set max tokens
    #[must_use]
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.prompt = self.prompt.max_tokens(max_tokens);
        self
    }

    /// Options for this call only
    #[must_use]
    pub fn options(mut self, overrides: RequestOptions) -> Self {
        self.overrides = overrides;
        self
    }

    /// Send the request
    pub async fn send(self) -> GatewayResult<ResolvedResponse> {
        self.model
            .dispatch_with_options(&self.prompt, InvokeMode::Complete, &self.overrides)
            .await
    }

    /// Send as a streaming request
    pub async fn stream(self) -> GatewayResult<ResolvedResponse> {
        self.model
            .dispatch_with_options(&self.prompt, InvokeMode::Stream, &self.overrides)
            .await
    }
}
