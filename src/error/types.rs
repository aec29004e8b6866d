//! Error types for the streaming generation bridge.

use thiserror::Error;

/// Errors raised by the client, the relay and generation sessions.
///
/// Caller cancellation is deliberately absent: a cancelled session is a
/// terminal outcome (`SessionOutcome::Cancelled`), not an error.
#[derive(Error, Debug, Clone)]
pub enum GenerationError {
    /// Generic HTTP failure (request could not be sent or read)
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Connection could not be established or dropped unexpectedly
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Connect or request timeout hit by the HTTP client
    #[error("Timeout error: {0}")]
    TimeoutError(String),

    /// The event stream broke mid-way (framing or transport error)
    #[error("Stream error: {0}")]
    StreamError(String),

    /// Non-success status returned by the server
    #[error("API error {code}: {message}")]
    ApiError {
        code: u16,
        message: String,
        details: Option<serde_json::Value>,
    },

    /// 401/403 returned by the server
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// Invalid client configuration (URL, header names, proxy, ...)
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Operation parameters failed validation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Operation invoked in a state that does not allow it
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// JSON serialization failure
    #[error("JSON error: {0}")]
    JsonError(String),

    /// Payload could not be parsed
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Unexpected internal failure (task join errors, panics)
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl GenerationError {
    /// Build an error from a non-success HTTP status and its response body.
    ///
    /// The message is taken from a JSON `detail`, `message` or `error` string
    /// when the body carries one, otherwise from the raw body text.
    pub fn from_http_status(status: u16, body: &str) -> Self {
        let details = serde_json::from_str::<serde_json::Value>(body).ok();
        let message = details
            .as_ref()
            .and_then(extract_message)
            .unwrap_or_else(|| {
                let trimmed = body.trim();
                if trimmed.is_empty() {
                    format!("HTTP status {status}")
                } else {
                    trimmed.to_string()
                }
            });

        match status {
            401 | 403 => Self::AuthenticationError(message),
            _ => Self::ApiError {
                code: status,
                message,
                details,
            },
        }
    }

    /// HTTP status code carried by the error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ApiError { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Whether starting a new session has a reasonable chance to succeed.
    ///
    /// Nothing in this crate retries; this is a hint for callers.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionError(_) | Self::TimeoutError(_) | Self::StreamError(_) => true,
            Self::ApiError { code, .. } => *code == 408 || *code == 429 || *code >= 500,
            _ => false,
        }
    }
}

/// Pull a human-readable message out of a JSON error body.
pub(crate) fn extract_message(value: &serde_json::Value) -> Option<String> {
    ["detail", "message", "error"].iter().find_map(|key| {
        match value.get(key)? {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            nested @ serde_json::Value::Object(_) => extract_message(nested),
            _ => None,
        }
    })
}
