//! Event envelopes and stream requests
//!
//! An [`EventEnvelope`] is the unit the relay yields. The relay knows nothing
//! about what a topic means; [`Topic`] only gives the well-known labels a name.

use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One item of a relay sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventEnvelope {
    /// A frame sent by the server: `event: <topic>` / `data: <payload>`.
    Message { topic: String, payload: String },
    /// The relay's closing signal for a failed or cancelled connection.
    TerminalError { description: String },
}

impl EventEnvelope {
    pub fn message(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::Message {
            topic: topic.into(),
            payload: payload.into(),
        }
    }

    pub fn terminal_error(description: impl Into<String>) -> Self {
        Self::TerminalError {
            description: description.into(),
        }
    }

    /// True for the closing `TerminalError` envelope.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::TerminalError { .. })
    }

    /// Topic of a message envelope.
    pub fn topic(&self) -> Option<Topic> {
        match self {
            Self::Message { topic, .. } => Some(Topic::from_label(topic)),
            Self::TerminalError { .. } => None,
        }
    }

    /// Payload of a message envelope.
    pub fn payload(&self) -> Option<&str> {
        match self {
            Self::Message { payload, .. } => Some(payload),
            Self::TerminalError { .. } => None,
        }
    }
}

/// Well-known topic labels chosen by the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Generated text fragment
    Content,
    /// Progress marker (full generation announces the section being written)
    Info,
    /// Server-reported failure
    Error,
    /// Chat thread identifier
    ThreadId,
    /// Any other label, kept verbatim
    Other(String),
}

impl Topic {
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "content" => Self::Content,
            "info" => Self::Info,
            "error" => Self::Error,
            "thread_id" => Self::ThreadId,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Content => "content",
            Self::Info => "info",
            Self::Error => "error",
            Self::ThreadId => "thread_id",
            Self::Other(label) => label,
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the relay needs to open one streaming request.
#[derive(Debug, Clone)]
pub struct StreamRequest {
    /// Absolute URL of the endpoint
    pub url: String,
    /// Auth and context headers
    pub headers: HeaderMap,
    /// JSON request body
    pub body: serde_json::Value,
}

impl StreamRequest {
    pub fn new(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            url: url.into(),
            headers: HeaderMap::new(),
            body,
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }
}
