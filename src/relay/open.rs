//! Opening a relay: spawn the producer, hand back the consumer.

use futures::FutureExt;
use reqwest::header::HeaderMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use super::source::EventSource;
use super::stream::{RelayStream, channel_with_token};
use crate::types::{EventEnvelope, StreamRequest};
use crate::utils::panic::panic_message;

/// Entry point of the relay layer.
pub struct EventRelay;

impl EventRelay {
    /// Open one streaming request on `source`.
    ///
    /// Returns immediately; the request is issued on a spawned task. The
    /// relay's token is a child of `cancel`, so cancelling the caller's token
    /// tears the connection down, while [`RelayStream::cancel`] only affects
    /// this relay.
    pub fn open(
        source: Arc<dyn EventSource>,
        request: StreamRequest,
        cancel: &CancellationToken,
    ) -> RelayStream {
        let token = cancel.child_token();
        let (sink, stream) = channel_with_token(token.clone());
        let panic_tx = sink.sender();
        let span = tracing::debug_span!("relay", url = %request.url);

        tokio::spawn(
            async move {
                tracing::debug!("opening relay");
                let run = AssertUnwindSafe(source.connect(request, sink, token)).catch_unwind();
                if let Err(payload) = run.await {
                    let description = panic_message(payload.as_ref());
                    tracing::error!(%description, "event source panicked");
                    let _ = panic_tx.send(EventEnvelope::terminal_error(format!(
                        "event source panicked: {description}"
                    )));
                }
                tracing::debug!("relay producer finished");
            }
            .instrument(span),
        );

        stream
    }

    /// Open a relay from its raw parts: destination, payload and headers.
    pub fn open_parts(
        source: Arc<dyn EventSource>,
        destination: impl Into<String>,
        payload: serde_json::Value,
        headers: HeaderMap,
        cancel: &CancellationToken,
    ) -> RelayStream {
        let request = StreamRequest::new(destination, payload).with_headers(headers);
        Self::open(source, request, cancel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::EventSink;
    use async_trait::async_trait;
    use futures_util::StreamExt;
    use std::time::Duration;

    struct Echo;

    #[async_trait]
    impl EventSource for Echo {
        async fn connect(&self, request: StreamRequest, sink: EventSink, _cancel: CancellationToken) {
            sink.opened();
            let _ = sink.message("content", request.url);
            let _ = sink.message("content", request.body.to_string());
            sink.close();
        }
    }

    struct Panicking;

    #[async_trait]
    impl EventSource for Panicking {
        async fn connect(&self, _request: StreamRequest, sink: EventSink, _cancel: CancellationToken) {
            let _ = sink.message("content", "before");
            panic!("decoder exploded");
        }
    }

    struct WaitForCancel;

    #[async_trait]
    impl EventSource for WaitForCancel {
        async fn connect(&self, _request: StreamRequest, sink: EventSink, cancel: CancellationToken) {
            sink.opened();
            cancel.cancelled().await;
            sink.fail("aborted by client");
        }
    }

    async fn collect(stream: RelayStream) -> Vec<EventEnvelope> {
        tokio::time::timeout(Duration::from_secs(2), stream.collect::<Vec<_>>())
            .await
            .expect("relay should terminate")
    }

    #[tokio::test]
    async fn open_forwards_request_and_ends_naturally() {
        let stream = EventRelay::open_parts(
            Arc::new(Echo),
            "http://localhost/x",
            serde_json::json!({"a": 1}),
            HeaderMap::new(),
            &CancellationToken::new(),
        );
        let out = collect(stream).await;
        assert_eq!(
            out,
            vec![
                EventEnvelope::message("content", "http://localhost/x"),
                EventEnvelope::message("content", r#"{"a":1}"#),
            ]
        );
    }

    #[tokio::test]
    async fn producer_panic_becomes_terminal_error() {
        let stream = EventRelay::open(
            Arc::new(Panicking),
            StreamRequest::new("http://localhost/x", serde_json::Value::Null),
            &CancellationToken::new(),
        );
        let out = collect(stream).await;
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], EventEnvelope::message("content", "before"));
        match &out[1] {
            EventEnvelope::TerminalError { description } => {
                assert!(description.contains("decoder exploded"))
            }
            other => panic!("unexpected envelope: {other:?}"),
        }
    }

    #[tokio::test]
    async fn parent_token_cancels_the_relay() {
        let parent = CancellationToken::new();
        let stream = EventRelay::open(
            Arc::new(WaitForCancel),
            StreamRequest::new("http://localhost/x", serde_json::Value::Null),
            &parent,
        );
        parent.cancel();

        let out = collect(stream).await;
        assert_eq!(out.len(), 1);
        assert!(out[0].is_terminal());
    }

    #[tokio::test]
    async fn relay_cancel_leaves_parent_untouched() {
        let parent = CancellationToken::new();
        let stream = EventRelay::open(
            Arc::new(WaitForCancel),
            StreamRequest::new("http://localhost/x", serde_json::Value::Null),
            &parent,
        );
        stream.cancel();
        let out = collect(stream).await;
        assert!(out.last().is_some_and(EventEnvelope::is_terminal));
        assert!(!parent.is_cancelled());
    }
}
