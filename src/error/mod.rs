//! Error Handling Module
//!
//! - Core error type (`GenerationError`)
//! - Type conversions from common error types
//!
//! # Example
//!
//! ```rust,ignore
//! use docgen_relay::error::GenerationError;
//!
//! let error = GenerationError::from_http_status(503, r#"{"detail":"overloaded"}"#);
//! assert_eq!(error.status_code(), Some(503));
//! assert!(error.is_retryable());
//! ```

mod conversions;
pub mod types;

pub use types::*;
