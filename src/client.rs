//! Generation client
//!
//! Binds a [`ClientConfig`] to an [`EventSource`] and hands out sessions. The
//! client is cheap to clone and shares its HTTP connection pool across every
//! session it starts.

use secrecy::ExposeSecret;
use std::sync::Arc;

use crate::config::ClientConfig;
use crate::error::GenerationError;
use crate::execution::http::{HttpHeaderBuilder, build_http_client};
use crate::relay::{EventSource, HttpEventSource};
use crate::session::{GenerationCallbacks, GenerationSession, SessionHandle};
use crate::types::{
    ChatTurnRequest, FullGenerationRequest, OperationRequest, PromptDraftRequest,
    SectionRepairRequest, StreamRequest,
};

#[derive(Clone)]
pub struct GenerationClient {
    config: Arc<ClientConfig>,
    source: Arc<dyn EventSource>,
}

impl GenerationClient {
    /// Client talking HTTP, with a `reqwest` client built from `config.http`.
    pub fn new(config: ClientConfig) -> Result<Self, GenerationError> {
        let http = build_http_client(&config.http)?;
        tracing::debug!(base_url = %config.base_url, "generation client ready");
        Ok(Self::with_source(config, Arc::new(HttpEventSource::new(http))))
    }

    /// Client over the `DOCGEN_*` environment configuration.
    pub fn from_env() -> Result<Self, GenerationError> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Client over a custom event source (tests, alternative transports).
    pub fn with_source(config: ClientConfig, source: Arc<dyn EventSource>) -> Self {
        Self {
            config: Arc::new(config),
            source,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// A fresh, idle session.
    pub fn session(&self) -> GenerationSession {
        GenerationSession::new(self.clone())
    }

    /// Start an operation of any kind on a fresh session.
    pub fn start(
        &self,
        request: impl Into<OperationRequest>,
        callbacks: impl GenerationCallbacks,
    ) -> Result<SessionHandle, GenerationError> {
        self.session().start(request, callbacks)
    }

    /// Generate every section of a document.
    pub fn generate_document(
        &self,
        request: FullGenerationRequest,
        callbacks: impl GenerationCallbacks,
    ) -> Result<SessionHandle, GenerationError> {
        self.start(request, callbacks)
    }

    /// Regenerate one section.
    pub fn repair_section(
        &self,
        request: SectionRepairRequest,
        callbacks: impl GenerationCallbacks,
    ) -> Result<SessionHandle, GenerationError> {
        self.start(request, callbacks)
    }

    /// Draft a section prompt.
    pub fn draft_prompt(
        &self,
        request: PromptDraftRequest,
        callbacks: impl GenerationCallbacks,
    ) -> Result<SessionHandle, GenerationError> {
        self.start(request, callbacks)
    }

    /// Send one chat message and stream the reply.
    pub fn chat_turn(
        &self,
        request: ChatTurnRequest,
        callbacks: impl GenerationCallbacks,
    ) -> Result<SessionHandle, GenerationError> {
        self.start(request, callbacks)
    }

    pub(crate) fn source(&self) -> Arc<dyn EventSource> {
        self.source.clone()
    }

    /// URL, headers and JSON body for one operation.
    pub fn stream_request(&self, request: &OperationRequest) -> Result<StreamRequest, GenerationError> {
        let config = &self.config;
        let mut headers = HttpHeaderBuilder::new()
            .with_event_stream_accept()
            .with_json_content_type()
            .with_custom_headers(&config.http.headers)?;

        if let Some(token) = &config.api_token {
            headers = headers.with_bearer_auth(token.expose_secret())?;
        }
        if let Some(org) = &config.organization_id {
            headers = headers.with_organization(&config.organization_header, org)?;
        }
        if config.http.stream_disable_compression {
            headers = headers.with_identity_encoding();
        }

        let url = config.url_for(request.kind());
        Ok(StreamRequest::new(url, request.to_body()?).with_headers(headers.build()))
    }
}

impl std::fmt::Debug for GenerationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationClient")
            .field("base_url", &self.config.base_url)
            .field("organization_id", &self.config.organization_id)
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(GenerationClient: Send, Sync, Clone);
static_assertions::assert_impl_all!(SessionHandle: Send);
static_assertions::assert_impl_all!(crate::relay::RelayStream: Send);
