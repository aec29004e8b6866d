//! HTTP Headers Utility
//!
//! Builds the header set attached to every streaming request: bearer auth,
//! organization scoping, event-stream negotiation.

use crate::error::GenerationError;
use reqwest::header::{
    ACCEPT, ACCEPT_ENCODING, AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE, HeaderMap, HeaderName,
    HeaderValue,
};
use std::collections::HashMap;

/// HTTP header builder for streaming requests
pub struct HttpHeaderBuilder {
    headers: HeaderMap,
}

impl HttpHeaderBuilder {
    /// Create a new header builder
    pub fn new() -> Self {
        Self {
            headers: HeaderMap::new(),
        }
    }

    /// Add Bearer token authorization
    pub fn with_bearer_auth(mut self, token: &str) -> Result<Self, GenerationError> {
        let mut auth_value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
            GenerationError::ConfigurationError(format!("Invalid API token format: {e}"))
        })?;
        auth_value.set_sensitive(true);
        self.headers.insert(AUTHORIZATION, auth_value);
        Ok(self)
    }

    /// Add the organization scoping header
    pub fn with_organization(
        self,
        header_name: &str,
        organization_id: &str,
    ) -> Result<Self, GenerationError> {
        self.with_header(header_name, organization_id)
    }

    /// Ask for a server-sent event stream
    pub fn with_event_stream_accept(mut self) -> Self {
        self.headers.insert(
            ACCEPT,
            HeaderValue::from_static(crate::defaults::headers::EVENT_STREAM),
        );
        self.headers
            .insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        self
    }

    /// Keep intermediaries from compressing (and buffering) the stream
    pub fn with_identity_encoding(mut self) -> Self {
        self.headers
            .insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));
        self
    }

    /// Add JSON content type
    pub fn with_json_content_type(mut self) -> Self {
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self
    }

    /// Add a custom header
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, GenerationError> {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            GenerationError::ConfigurationError(format!("Invalid header name '{name}': {e}"))
        })?;
        self.headers.insert(
            header_name,
            HeaderValue::from_str(value).map_err(|e| {
                GenerationError::ConfigurationError(format!(
                    "Invalid header value for '{name}': {e}"
                ))
            })?,
        );
        Ok(self)
    }

    /// Add multiple custom headers from a HashMap
    pub fn with_custom_headers(
        mut self,
        custom_headers: &HashMap<String, String>,
    ) -> Result<Self, GenerationError> {
        for (key, value) in custom_headers {
            self = self.with_header(key, value)?;
        }
        Ok(self)
    }

    /// Build the final HeaderMap
    pub fn build(self) -> HeaderMap {
        self.headers
    }
}

impl Default for HttpHeaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_builder() {
        let headers = HttpHeaderBuilder::new()
            .with_bearer_auth("test-token")
            .unwrap()
            .with_organization("X-Organization-Id", "org-42")
            .unwrap()
            .with_event_stream_accept()
            .with_json_content_type()
            .build();

        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer test-token");
        assert!(headers.get(AUTHORIZATION).unwrap().is_sensitive());
        assert_eq!(headers.get("x-organization-id").unwrap(), "org-42");
        assert_eq!(headers.get(ACCEPT).unwrap(), "text/event-stream");
        assert_eq!(headers.get(CACHE_CONTROL).unwrap(), "no-cache");
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
    }

    #[test]
    fn invalid_header_name_is_a_configuration_error() {
        let err = HttpHeaderBuilder::new()
            .with_header("bad header", "v")
            .err()
            .expect("invalid name");
        assert!(matches!(err, GenerationError::ConfigurationError(_)));
    }

    #[test]
    fn custom_headers_override_earlier_values() {
        let extra = HashMap::from([("Accept".to_string(), "application/x-ndjson".to_string())]);
        let headers = HttpHeaderBuilder::new()
            .with_event_stream_accept()
            .with_custom_headers(&extra)
            .unwrap()
            .build();
        assert_eq!(headers.get(ACCEPT).unwrap(), "application/x-ndjson");
    }
}
