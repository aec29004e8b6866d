//! HTTP client construction from `HttpConfig`.

use crate::error::GenerationError;
use crate::types::HttpConfig;

/// Build a `reqwest::Client` for streaming requests.
pub fn build_http_client(cfg: &HttpConfig) -> Result<reqwest::Client, GenerationError> {
    let mut builder =
        reqwest::Client::builder().tcp_keepalive(crate::defaults::http::TCP_KEEP_ALIVE);

    if let Some(timeout) = cfg.timeout {
        builder = builder.timeout(timeout);
    }
    if let Some(connect_timeout) = cfg.connect_timeout {
        builder = builder.connect_timeout(connect_timeout);
    }
    if let Some(proxy_url) = &cfg.proxy {
        let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| {
            GenerationError::ConfigurationError(format!("Invalid proxy URL: {e}"))
        })?;
        builder = builder.proxy(proxy);
    }
    if let Some(user_agent) = &cfg.user_agent {
        builder = builder.user_agent(user_agent);
    }

    // Default headers
    if !cfg.headers.is_empty() {
        let mut headers = reqwest::header::HeaderMap::new();
        for (k, v) in &cfg.headers {
            let name = reqwest::header::HeaderName::from_bytes(k.as_bytes()).map_err(|e| {
                GenerationError::ConfigurationError(format!("Invalid header name '{k}': {e}"))
            })?;
            let value = reqwest::header::HeaderValue::from_str(v).map_err(|e| {
                GenerationError::ConfigurationError(format!("Invalid header value for '{k}': {e}"))
            })?;
            headers.insert(name, value);
        }
        builder = builder.default_headers(headers);
    }

    builder.build().map_err(|e| {
        GenerationError::ConfigurationError(format!("Failed to build HTTP client: {e}"))
    })
}
