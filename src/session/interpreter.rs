//! Topic interpretation per operation kind.
//!
//! | topic       | full-generation | section-repair | prompt-draft | chat-turn |
//! |-------------|-----------------|----------------|--------------|-----------|
//! | `content`   | text            | text           | text         | text      |
//! | `info`      | section id      | -              | -            | -         |
//! | `thread_id` | -               | -              | -            | thread id |
//! | `error`     | fail            | fail           | fail         | fail      |
//!
//! Anything else is ignored.

use serde::Deserialize;

use crate::defaults::relay::UNSPECIFIED_SERVER_ERROR;
use crate::error::{GenerationError, extract_message};
use crate::types::{OperationKind, Topic};

/// What the session does with one message envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Deliver the payload through `on_text`
    Text,
    /// Deliver the id through `on_metadata`
    Metadata(String),
    /// Report the description through `on_error` and stop
    Fail(String),
    /// Nothing to deliver
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    Text,
    SectionInfo,
    ThreadId,
    Fail,
}

fn rule(kind: OperationKind, topic: &Topic) -> Option<Rule> {
    match (topic, kind) {
        (Topic::Content, _) => Some(Rule::Text),
        (Topic::Error, _) => Some(Rule::Fail),
        (Topic::Info, OperationKind::FullGeneration) => Some(Rule::SectionInfo),
        (Topic::ThreadId, OperationKind::ChatTurn) => Some(Rule::ThreadId),
        _ => None,
    }
}

/// Decide what a `topic`/`payload` frame means for `kind`.
pub fn interpret(kind: OperationKind, topic: &str, payload: &str) -> Action {
    let topic = Topic::from_label(topic);
    let Some(rule) = rule(kind, &topic) else {
        tracing::trace!(%kind, %topic, "ignoring topic");
        return Action::Skip;
    };

    match rule {
        Rule::Text => Action::Text,
        Rule::SectionInfo => match parse_section_info(payload) {
            Ok(section_id) => Action::Metadata(section_id),
            Err(e) => {
                tracing::warn!(%kind, error = %e, payload, "skipping malformed info payload");
                Action::Skip
            }
        },
        Rule::ThreadId => {
            let thread_id = payload.trim();
            if thread_id.is_empty() {
                tracing::warn!(%kind, "skipping empty thread id");
                Action::Skip
            } else {
                Action::Metadata(thread_id.to_string())
            }
        }
        Rule::Fail => Action::Fail(error_description(payload)),
    }
}

#[derive(Debug, Deserialize)]
struct InfoPayload {
    section_id: serde_json::Value,
}

/// Extract the originating section id from an `info` payload.
pub fn parse_section_info(payload: &str) -> Result<String, GenerationError> {
    let info: InfoPayload = serde_json::from_str(payload)
        .map_err(|e| GenerationError::ParseError(format!("invalid info payload: {e}")))?;
    match info.section_id {
        serde_json::Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(GenerationError::ParseError(format!(
            "section_id must be a non-empty string or number, got {other}"
        ))),
    }
}

/// Human-readable description of an `error` payload.
pub fn error_description(payload: &str) -> String {
    let trimmed = payload.trim();
    if trimmed.is_empty() {
        return UNSPECIFIED_SERVER_ERROR.to_string();
    }
    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Ok(value @ serde_json::Value::Object(_)) => {
            extract_message(&value).unwrap_or_else(|| trimmed.to_string())
        }
        _ => trimmed.to_string(),
    }
}
