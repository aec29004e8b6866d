//! docgen-relay
//!
//! Streaming generation bridge for the document client.
//!
//! The crate turns a long-lived server-sent event connection into a pull-based
//! sequence of [`EventEnvelope`]s (the [`relay`] layer) and interprets that
//! sequence for the four generation operations (the [`session`] layer):
//! full document generation, section repair, prompt drafting and chat turns.
//!
//! ```rust,ignore
//! use docgen_relay::prelude::*;
//!
//! let config = ClientConfig::builder()
//!     .base_url("https://api.example.com/v1")
//!     .api_token("token")
//!     .organization_id("org-1")
//!     .build()?;
//! let client = GenerationClient::new(config)?;
//!
//! let callbacks = Callbacks::new()
//!     .with_text(|fragment| print!("{fragment}"))
//!     .with_close(|| println!());
//! let handle = client.chat_turn(ChatTurnRequest::new("Summarize section 2"), callbacks)?;
//! let report = handle.finish().await?;
//! ```
#![deny(unsafe_code)]

pub mod client;
pub mod config;
pub mod defaults;
pub mod error;
pub mod execution;
pub mod relay;
pub mod session;
pub mod telemetry;
pub mod types;
pub mod utils;

pub use client::GenerationClient;
pub use config::{ClientConfig, ClientConfigBuilder, EndpointPaths};
pub use error::GenerationError;
pub use relay::{EventRelay, EventSink, EventSource, HttpEventSource, RelayStream};
pub use session::{
    Callbacks, GenerationCallbacks, GenerationSession, SessionHandle, SessionOutcome,
    SessionReport, SessionState,
};
pub use types::{EventEnvelope, OperationKind, OperationRequest, StreamRequest, Topic};

/// Commonly used types, re-exported for glob import.
pub mod prelude {
    pub use crate::client::GenerationClient;
    pub use crate::config::{ClientConfig, EndpointPaths};
    pub use crate::error::GenerationError;
    pub use crate::session::{
        Callbacks, GenerationCallbacks, SessionHandle, SessionOutcome, SessionReport,
        SessionState,
    };
    pub use crate::types::{
        ChatTurnRequest, EventEnvelope, FullGenerationRequest, OperationKind, OperationRequest,
        PromptDraftRequest, SectionRepairRequest,
    };
    pub use crate::utils::cancel::CancelHandle;
}
