//! HTTP Utilities
//!
//! - HTTP client construction
//! - Header management

pub mod client;
pub mod headers;

pub use client::*;
pub use headers::*;
