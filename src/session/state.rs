//! Session state, outcome and the final report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use uuid::Uuid;

use crate::types::OperationKind;

/// Observable lifecycle state of a session.
///
/// `Idle -> Streaming -> {Completed | Failed | Cancelled}`; a session
/// cancelled before its connection opens goes straight from `Idle` to
/// `Cancelled`. Terminal states are absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Streaming,
    Completed,
    Failed,
    Cancelled,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// Move `state` to `next` unless it already reached a terminal state.
pub(crate) fn transition(state: &watch::Sender<SessionState>, next: SessionState) -> bool {
    state.send_if_modified(|current| {
        if current.is_terminal() || *current == next {
            false
        } else {
            *current = next;
            true
        }
    })
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SessionOutcome {
    Completed,
    Failed { description: String },
    Cancelled,
}

impl SessionOutcome {
    pub fn state(&self) -> SessionState {
        match self {
            Self::Completed => SessionState::Completed,
            Self::Failed { .. } => SessionState::Failed,
            Self::Cancelled => SessionState::Cancelled,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Failure description, if the session failed.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed { description } => Some(description),
            _ => None,
        }
    }
}

/// Text attributed to one section of a full generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionText {
    pub section_id: String,
    pub text: String,
}

/// Everything a finished session delivered, for callers that prefer awaiting
/// a result over reacting to callbacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionReport {
    pub session_id: Uuid,
    pub kind: OperationKind,
    pub outcome: SessionOutcome,
    /// Concatenation of every delivered text fragment.
    pub text: String,
    /// Last correlation id seen (section id or thread id), seeded from the
    /// request when it already names one.
    pub correlation_id: Option<String>,
    /// Per-section text, full generation only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<SectionText>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SessionReport {
    pub fn is_success(&self) -> bool {
        self.outcome.is_completed()
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}
