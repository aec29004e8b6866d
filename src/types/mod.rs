//! Shared data types: HTTP configuration, event envelopes, operation requests.

pub mod envelope;
pub mod http;
pub mod operation;

pub use envelope::*;
pub use http::*;
pub use operation::*;
