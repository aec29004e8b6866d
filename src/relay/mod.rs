//! Event Relay
//!
//! Presents a push-based server-sent event connection as a pull-based,
//! ordered sequence of [`EventEnvelope`](crate::types::EventEnvelope)s.
//!
//! - [`EventSink`]: producer half, fed by an [`EventSource`]
//! - [`RelayStream`]: consumer half, a `futures::Stream`
//! - [`EventRelay::open`]: spawns the producer for one request
//!
//! One producer and one consumer share an unbounded channel; nothing else is
//! synchronized. Every way a connection can end (natural end, error,
//! cancellation) delivers the already queued envelopes first, then exactly one
//! closing signal.

mod http_source;
mod open;
mod sink;
mod source;
mod stream;

pub use http_source::HttpEventSource;
pub use open::EventRelay;
pub use sink::{ConnectionState, EventSink, RelayClosed};
pub use source::EventSource;
pub use stream::{RelayStream, channel};
