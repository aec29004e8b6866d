//! Consumer half of a relay.

use futures::Stream;
use futures::stream::FusedStream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::{CancellationToken, DropGuard};

use super::sink::{ConnectionState, EventSink};
use crate::defaults::relay::CANCELLED_DESCRIPTION;
use crate::types::EventEnvelope;

type EnvelopeStream = Pin<Box<dyn Stream<Item = EventEnvelope> + Send>>;

/// Pull side of a relay: an ordered, single-pass sequence of envelopes.
///
/// The sequence ends after the producer closes and every queued envelope has
/// been delivered, or right after the first [`EventEnvelope::TerminalError`].
/// Cancelling (or dropping) the stream cancels the producer's token.
pub struct RelayStream {
    inner: EnvelopeStream,
    cancel: CancellationToken,
    connection: watch::Receiver<ConnectionState>,
    finished: bool,
    _drop_guard: DropGuard,
}

/// Create a detached relay: a sink to push into and the stream reading it.
pub fn channel() -> (EventSink, RelayStream) {
    channel_with_token(CancellationToken::new())
}

pub(crate) fn channel_with_token(token: CancellationToken) -> (EventSink, RelayStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
    (
        EventSink::new(tx, state_tx),
        RelayStream::new(rx, state_rx, token),
    )
}

impl RelayStream {
    fn new(
        mut rx: mpsc::UnboundedReceiver<EventEnvelope>,
        connection: watch::Receiver<ConnectionState>,
        token: CancellationToken,
    ) -> Self {
        let cancelled = token.clone();
        // Stream-based cancellation via async_stream avoids pin projection.
        let inner = async_stream::stream! {
            loop {
                tokio::select! {
                    biased;
                    next = rx.recv() => {
                        let Some(envelope) = next else { return };
                        let terminal = envelope.is_terminal();
                        yield envelope;
                        if terminal {
                            return;
                        }
                    }
                    _ = cancelled.cancelled() => {
                        // Whatever already arrived is delivered before the close signal.
                        while let Ok(envelope) = rx.try_recv() {
                            let terminal = envelope.is_terminal();
                            yield envelope;
                            if terminal {
                                return;
                            }
                        }
                        yield EventEnvelope::terminal_error(CANCELLED_DESCRIPTION);
                        return;
                    }
                }
            }
        };

        Self {
            inner: Box::pin(inner),
            cancel: token.clone(),
            connection,
            finished: false,
            _drop_guard: token.drop_guard(),
        }
    }

    /// Abort the connection from the client side.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Current connection state reported by the producer.
    pub fn connection_state(&self) -> ConnectionState {
        *self.connection.borrow()
    }

    /// Wait until the connection leaves `Connecting` and return the state seen.
    pub async fn ready(&mut self) -> ConnectionState {
        self.connection
            .wait_for(|state| *state != ConnectionState::Connecting)
            .await
            .map(|state| *state)
            .unwrap_or(ConnectionState::Closed)
    }

    /// True once the sequence has ended.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl Stream for RelayStream {
    type Item = EventEnvelope;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }
        let polled = self.inner.as_mut().poll_next(cx);
        if let Poll::Ready(None) = polled {
            self.finished = true;
        }
        polled
    }
}

impl FusedStream for RelayStream {
    fn is_terminated(&self) -> bool {
        self.finished
    }
}

impl std::fmt::Debug for RelayStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayStream")
            .field("connection", &self.connection_state())
            .field("cancelled", &self.is_cancelled())
            .field("finished", &self.finished)
            .finish()
    }
}
