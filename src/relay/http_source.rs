//! HTTP event source
//!
//! Issues a JSON POST and parses the `text/event-stream` response with
//! eventsource-stream, which handles UTF-8 boundaries, line buffering and SSE
//! framing. Each `event:`/`data:` frame becomes one relay message.

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

use super::sink::EventSink;
use super::source::EventSource;
use crate::defaults::relay::CANCELLED_DESCRIPTION;
use crate::error::GenerationError;
use crate::types::StreamRequest;

/// `EventSource` backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpEventSource {
    http: reqwest::Client,
}

impl HttpEventSource {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl EventSource for HttpEventSource {
    async fn connect(&self, request: StreamRequest, sink: EventSink, cancel: CancellationToken) {
        let StreamRequest { url, headers, body } = request;
        let send = self.http.post(&url).headers(headers).json(&body).send();

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("cancelled before response headers");
                sink.fail(CANCELLED_DESCRIPTION);
                return;
            }
            res = send => res,
        };

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                let err = GenerationError::from(e);
                tracing::warn!(error = %err, "failed to open event stream");
                sink.fail(err.to_string());
                return;
            }
        };

        let status = response.status();
        if !status.is_success() {
            let text = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!(status = status.as_u16(), "cancelled while reading error body");
                    sink.fail(CANCELLED_DESCRIPTION);
                    return;
                }
                text = response.text() => text.unwrap_or_default(),
            };
            let err = GenerationError::from_http_status(status.as_u16(), &text);
            tracing::warn!(status = status.as_u16(), error = %err, "event stream rejected");
            sink.fail(err.to_string());
            return;
        }

        tracing::debug!(status = status.as_u16(), "event stream open");
        sink.opened();

        let mut events = std::pin::pin!(response.bytes_stream().eventsource());
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!("event stream cancelled by client");
                    sink.fail(CANCELLED_DESCRIPTION);
                    return;
                }
                next = events.next() => match next {
                    Some(Ok(event)) => {
                        tracing::trace!(topic = %event.event, bytes = event.data.len(), "frame");
                        if sink.message(event.event, event.data).is_err() {
                            tracing::debug!("relay consumer dropped; closing event stream");
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        let err = GenerationError::StreamError(format!("SSE stream error: {e}"));
                        tracing::warn!(error = %err, "event stream broke");
                        sink.fail(err.to_string());
                        return;
                    }
                    None => {
                        tracing::debug!("event stream ended");
                        sink.close();
                        return;
                    }
                }
            }
        }
    }
}
