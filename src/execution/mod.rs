//! Execution layer: the HTTP plumbing behind every relay.

pub mod http;
