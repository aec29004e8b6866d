//! Event source abstraction.
//!
//! An `EventSource` drives one streaming request and pushes what it receives
//! into an [`EventSink`]. The production implementation is
//! [`HttpEventSource`](super::HttpEventSource); tests and alternative transports
//! provide their own.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::sink::EventSink;
use crate::types::StreamRequest;

/// Producer of relay envelopes for one request.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Issue `request` and forward its frames into `sink` until the
    /// connection ends or `cancel` fires.
    ///
    /// Implementations report failures (including cancellation) through
    /// [`EventSink::fail`] and a natural end through [`EventSink::close`] or by
    /// dropping the sink.
    async fn connect(&self, request: StreamRequest, sink: EventSink, cancel: CancellationToken);
}
