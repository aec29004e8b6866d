//! Client configuration
//!
//! `ClientConfig` carries everything a [`GenerationClient`](crate::GenerationClient)
//! needs: where the service lives, how to authenticate, which organization to
//! scope requests to and how to tune the HTTP layer.

use reqwest::header::HeaderName;
use secrecy::SecretString;
use std::time::Duration;

use crate::defaults::{endpoints, env, headers};
use crate::error::GenerationError;
use crate::types::{HttpConfig, OperationKind};

/// URL path per operation kind, appended to the base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointPaths {
    pub full_generation: String,
    pub section_repair: String,
    pub prompt_draft: String,
    pub chat_turn: String,
}

impl Default for EndpointPaths {
    fn default() -> Self {
        Self {
            full_generation: endpoints::FULL_GENERATION.to_string(),
            section_repair: endpoints::SECTION_REPAIR.to_string(),
            prompt_draft: endpoints::PROMPT_DRAFT.to_string(),
            chat_turn: endpoints::CHAT_TURN.to_string(),
        }
    }
}

impl EndpointPaths {
    pub fn path(&self, kind: OperationKind) -> &str {
        match kind {
            OperationKind::FullGeneration => &self.full_generation,
            OperationKind::SectionRepair => &self.section_repair,
            OperationKind::PromptDraft => &self.prompt_draft,
            OperationKind::ChatTurn => &self.chat_turn,
        }
    }

    fn path_mut(&mut self, kind: OperationKind) -> &mut String {
        match kind {
            OperationKind::FullGeneration => &mut self.full_generation,
            OperationKind::SectionRepair => &mut self.section_repair,
            OperationKind::PromptDraft => &mut self.prompt_draft,
            OperationKind::ChatTurn => &mut self.chat_turn,
        }
    }
}

/// Validated client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service root, without a trailing slash.
    pub base_url: String,
    /// Bearer token; requests go out unauthenticated when absent.
    pub api_token: Option<SecretString>,
    pub organization_id: Option<String>,
    /// Header carrying `organization_id`.
    pub organization_header: String,
    pub endpoints: EndpointPaths,
    pub http: HttpConfig,
    /// Cancel every session after this long. `None` means sessions run until
    /// the server closes the stream.
    pub session_timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Full URL for an operation kind.
    pub fn url_for(&self, kind: OperationKind) -> String {
        format!("{}{}", self.base_url, self.endpoints.path(kind))
    }

    /// Read configuration from the `DOCGEN_*` environment variables.
    ///
    /// `DOCGEN_BASE_URL` is required. `DOCGEN_API_TOKEN`,
    /// `DOCGEN_ORGANIZATION_ID`, `DOCGEN_ORGANIZATION_HEADER` and
    /// `DOCGEN_SESSION_TIMEOUT_SECS` are optional.
    pub fn from_env() -> Result<Self, GenerationError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, GenerationError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let base_url = var(env::BASE_URL).ok_or_else(|| {
            GenerationError::ConfigurationError(format!("{} is not set", env::BASE_URL))
        })?;
        let mut builder = Self::builder().base_url(base_url);

        if let Some(token) = var(env::API_TOKEN) {
            builder = builder.api_token(token);
        }
        if let Some(org) = var(env::ORGANIZATION_ID) {
            builder = builder.organization_id(org);
        }
        if let Some(header) = var(env::ORGANIZATION_HEADER) {
            builder = builder.organization_header(header);
        }
        if let Some(secs) = var(env::SESSION_TIMEOUT_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|e| {
                GenerationError::ConfigurationError(format!(
                    "{} must be a whole number of seconds: {e}",
                    env::SESSION_TIMEOUT_SECS
                ))
            })?;
            builder = builder.session_timeout(Duration::from_secs(secs));
        }

        builder.build()
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    base_url: Option<String>,
    api_token: Option<SecretString>,
    organization_id: Option<String>,
    organization_header: Option<String>,
    endpoints: EndpointPaths,
    http: Option<HttpConfig>,
    session_timeout: Option<Duration>,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(SecretString::from(token.into()));
        self
    }

    pub fn organization_id(mut self, id: impl Into<String>) -> Self {
        self.organization_id = Some(id.into());
        self
    }

    /// Override the organization header name (default `X-Organization-Id`).
    pub fn organization_header(mut self, name: impl Into<String>) -> Self {
        self.organization_header = Some(name.into());
        self
    }

    pub fn endpoints(mut self, endpoints: EndpointPaths) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Override the path of a single operation kind.
    pub fn endpoint(mut self, kind: OperationKind, path: impl Into<String>) -> Self {
        *self.endpoints.path_mut(kind) = path.into();
        self
    }

    pub fn http_config(mut self, http: HttpConfig) -> Self {
        self.http = Some(http);
        self
    }

    pub fn session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<ClientConfig, GenerationError> {
        let base_url = self
            .base_url
            .ok_or_else(|| GenerationError::ConfigurationError("base_url is required".into()))?;
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(GenerationError::ConfigurationError(format!(
                "base_url must start with http:// or https://, got {base_url:?}"
            )));
        }

        let organization_header = self
            .organization_header
            .unwrap_or_else(|| headers::ORGANIZATION_HEADER.to_string());
        HeaderName::from_bytes(organization_header.as_bytes()).map_err(|e| {
            GenerationError::ConfigurationError(format!(
                "invalid organization header {organization_header:?}: {e}"
            ))
        })?;

        for kind in OperationKind::ALL {
            let path = self.endpoints.path(kind);
            if !path.starts_with('/') {
                return Err(GenerationError::ConfigurationError(format!(
                    "endpoint for {kind} must start with '/', got {path:?}"
                )));
            }
        }

        let http = self.http.unwrap_or_default();
        for name in http.headers.keys() {
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                GenerationError::ConfigurationError(format!("invalid header name {name:?}: {e}"))
            })?;
        }

        Ok(ClientConfig {
            base_url,
            api_token: self.api_token,
            organization_id: self.organization_id,
            organization_header,
            endpoints: self.endpoints,
            http,
            session_timeout: self.session_timeout,
        })
    }
}
