//! Operation kinds and their request payloads
//!
//! The four long-running operations share one relay and differ only in the
//! endpoint, the JSON body, and how their session interprets topics.

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use crate::error::GenerationError;

/// The long-running operations served by the streaming bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationKind {
    FullGeneration,
    SectionRepair,
    PromptDraft,
    ChatTurn,
}

impl OperationKind {
    pub const ALL: [OperationKind; 4] = [
        Self::FullGeneration,
        Self::SectionRepair,
        Self::PromptDraft,
        Self::ChatTurn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullGeneration => "full-generation",
            Self::SectionRepair => "section-repair",
            Self::PromptDraft => "prompt-draft",
            Self::ChatTurn => "chat-turn",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generate every section of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct FullGenerationRequest {
    #[validate(length(min = 1))]
    pub document_id: String,
    /// Execution record the generation is tracked under
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl FullGenerationRequest {
    pub fn new(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            execution_id: None,
            instructions: None,
        }
    }

    pub fn with_execution_id(mut self, execution_id: impl Into<String>) -> Self {
        self.execution_id = Some(execution_id.into());
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }
}

/// Regenerate one section of a document following repair instructions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SectionRepairRequest {
    #[validate(length(min = 1))]
    pub document_id: String,
    #[validate(length(min = 1))]
    pub section_id: String,
    #[validate(length(min = 1))]
    pub instructions: String,
}

impl SectionRepairRequest {
    pub fn new(
        document_id: impl Into<String>,
        section_id: impl Into<String>,
        instructions: impl Into<String>,
    ) -> Self {
        Self {
            document_id: document_id.into(),
            section_id: section_id.into(),
            instructions: instructions.into(),
        }
    }
}

/// Draft the generation prompt of an asset type section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct PromptDraftRequest {
    #[validate(length(min = 1))]
    pub asset_type_id: String,
    #[validate(length(min = 1))]
    pub section_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PromptDraftRequest {
    pub fn new(asset_type_id: impl Into<String>, section_name: impl Into<String>) -> Self {
        Self {
            asset_type_id: asset_type_id.into(),
            section_name: section_name.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// One user turn of a chat thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ChatTurnRequest {
    #[validate(length(min = 1))]
    pub message: String,
    /// Continue an existing thread; the server announces a new one otherwise
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    /// Document the conversation is grounded on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
}

impl ChatTurnRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            thread_id: None,
            document_id: None,
        }
    }

    pub fn with_thread_id(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    pub fn with_document_id(mut self, document_id: impl Into<String>) -> Self {
        self.document_id = Some(document_id.into());
        self
    }
}

/// An operation kind together with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationRequest {
    FullGeneration(FullGenerationRequest),
    SectionRepair(SectionRepairRequest),
    PromptDraft(PromptDraftRequest),
    ChatTurn(ChatTurnRequest),
}

impl OperationRequest {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::FullGeneration(_) => OperationKind::FullGeneration,
            Self::SectionRepair(_) => OperationKind::SectionRepair,
            Self::PromptDraft(_) => OperationKind::PromptDraft,
            Self::ChatTurn(_) => OperationKind::ChatTurn,
        }
    }

    /// Validate the parameters before any connection is opened.
    pub fn validate(&self) -> Result<(), GenerationError> {
        match self {
            Self::FullGeneration(r) => r.validate()?,
            Self::SectionRepair(r) => r.validate()?,
            Self::PromptDraft(r) => r.validate()?,
            Self::ChatTurn(r) => r.validate()?,
        }
        Ok(())
    }

    /// JSON body sent to the operation endpoint.
    pub fn to_body(&self) -> Result<serde_json::Value, GenerationError> {
        let body = match self {
            Self::FullGeneration(r) => serde_json::to_value(r)?,
            Self::SectionRepair(r) => serde_json::to_value(r)?,
            Self::PromptDraft(r) => serde_json::to_value(r)?,
            Self::ChatTurn(r) => serde_json::to_value(r)?,
        };
        Ok(body)
    }

    /// Correlation id known before the stream starts.
    ///
    /// Chat turns continue the requested thread; section repair reports on the
    /// section being repaired.
    pub fn initial_correlation_id(&self) -> Option<String> {
        match self {
            Self::ChatTurn(r) => r.thread_id.clone(),
            Self::SectionRepair(r) => Some(r.section_id.clone()),
            Self::FullGeneration(_) | Self::PromptDraft(_) => None,
        }
    }
}

impl From<FullGenerationRequest> for OperationRequest {
    fn from(r: FullGenerationRequest) -> Self {
        Self::FullGeneration(r)
    }
}

impl From<SectionRepairRequest> for OperationRequest {
    fn from(r: SectionRepairRequest) -> Self {
        Self::SectionRepair(r)
    }
}

impl From<PromptDraftRequest> for OperationRequest {
    fn from(r: PromptDraftRequest) -> Self {
        Self::PromptDraft(r)
    }
}

impl From<ChatTurnRequest> for OperationRequest {
    fn from(r: ChatTurnRequest) -> Self {
        Self::ChatTurn(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_follows_variant() {
        let req: OperationRequest = ChatTurnRequest::new("hi").into();
        assert_eq!(req.kind(), OperationKind::ChatTurn);
        let req: OperationRequest = PromptDraftRequest::new("at-1", "Scope").into();
        assert_eq!(req.kind(), OperationKind::PromptDraft);
    }

    #[test]
    fn body_omits_unset_optionals() {
        let req: OperationRequest = FullGenerationRequest::new("doc-1")
            .with_execution_id("exec-7")
            .into();
        let body = req.to_body().unwrap();
        assert_eq!(
            body,
            serde_json::json!({"document_id": "doc-1", "execution_id": "exec-7"})
        );
    }

    #[test]
    fn empty_identifiers_are_rejected() {
        let req: OperationRequest = SectionRepairRequest::new("doc-1", "", "shorter").into();
        let err = req.validate().unwrap_err();
        assert!(matches!(err, GenerationError::InvalidInput(ref m) if m.contains("section_id")));

        let req: OperationRequest = ChatTurnRequest::new("").into();
        assert!(req.validate().is_err());
    }

    #[test]
    fn initial_correlation_ids() {
        let chat: OperationRequest = ChatTurnRequest::new("hi").with_thread_id("t-1").into();
        assert_eq!(chat.initial_correlation_id().as_deref(), Some("t-1"));

        let repair: OperationRequest = SectionRepairRequest::new("d", "s-4", "fix").into();
        assert_eq!(repair.initial_correlation_id().as_deref(), Some("s-4"));

        let full: OperationRequest = FullGenerationRequest::new("d").into();
        assert_eq!(full.initial_correlation_id(), None);
    }

    #[test]
    fn kind_labels() {
        let labels: Vec<&str> = OperationKind::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(
            labels,
            ["full-generation", "section-repair", "prompt-draft", "chat-turn"]
        );
        assert_eq!(
            serde_json::to_value(OperationKind::ChatTurn).unwrap(),
            "chat-turn"
        );
    }
}
