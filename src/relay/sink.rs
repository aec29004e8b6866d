//! Producer half of a relay.

use tokio::sync::{mpsc, watch};

use crate::types::EventEnvelope;

/// Connection lifecycle as seen by the producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Request issued, no response yet
    Connecting,
    /// Response headers received, frames may follow
    Open,
    /// The producer is done (natural end, error or cancellation)
    Closed,
}

/// Returned by [`EventSink::message`] once the consumer dropped its stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("relay consumer has gone away")]
pub struct RelayClosed;

/// Push side of a relay.
///
/// Push callbacks (message arrived, connection closed, connection errored)
/// map onto [`message`](Self::message), [`close`](Self::close) and
/// [`fail`](Self::fail). The closing calls take `self`, so a producer emits at
/// most one closing signal. Dropping the sink counts as a natural close.
#[derive(Debug)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<EventEnvelope>,
    connection: watch::Sender<ConnectionState>,
}

impl EventSink {
    pub(crate) fn new(
        tx: mpsc::UnboundedSender<EventEnvelope>,
        connection: watch::Sender<ConnectionState>,
    ) -> Self {
        Self { tx, connection }
    }

    /// Mark the connection as established.
    pub fn opened(&self) {
        self.connection.send_if_modified(|state| {
            if *state == ConnectionState::Connecting {
                *state = ConnectionState::Open;
                true
            } else {
                false
            }
        });
    }

    /// Queue one frame. Never blocks; the queue is unbounded.
    pub fn message(
        &self,
        topic: impl Into<String>,
        payload: impl Into<String>,
    ) -> Result<(), RelayClosed> {
        // A frame can only arrive over an established connection.
        self.opened();
        self.tx
            .send(EventEnvelope::message(topic, payload))
            .map_err(|_| RelayClosed)
    }

    /// End the relay with an error. Frames queued earlier are still delivered.
    pub fn fail(self, description: impl Into<String>) {
        let _ = self.tx.send(EventEnvelope::terminal_error(description));
    }

    /// End the relay normally.
    pub fn close(self) {}

    /// True once the consumer dropped its stream.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub(crate) fn sender(&self) -> mpsc::UnboundedSender<EventEnvelope> {
        self.tx.clone()
    }
}

impl Drop for EventSink {
    fn drop(&mut self) {
        self.connection.send_replace(ConnectionState::Closed);
    }
}
