//! Default Configuration Values
//!
//! Centralizes the default values used by the client, relay and sessions.

use std::time::Duration;

/// HTTP client defaults
pub mod http {
    use super::*;

    /// Default connection timeout for establishing HTTP connections.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Default User-Agent string for HTTP requests
    pub const USER_AGENT: &str = concat!("docgen-relay/", env!("CARGO_PKG_VERSION"));

    /// Default keep-alive interval for the TCP socket behind a stream.
    pub const TCP_KEEP_ALIVE: Duration = Duration::from_secs(60);
}

/// Header names and values shared by every streaming request
pub mod headers {
    /// Header that scopes every request to one organization (tenant).
    pub const ORGANIZATION_HEADER: &str = "X-Organization-Id";

    /// MIME type of a server-sent event stream.
    pub const EVENT_STREAM: &str = "text/event-stream";
}

/// Endpoint paths, one per operation kind
pub mod endpoints {
    pub const FULL_GENERATION: &str = "/generation/stream";
    pub const SECTION_REPAIR: &str = "/generation/repair/stream";
    pub const PROMPT_DRAFT: &str = "/prompts/draft/stream";
    pub const CHAT_TURN: &str = "/chat/stream";
}

/// Relay defaults
pub mod relay {
    /// Description carried by the terminal envelope of a cancelled relay.
    pub const CANCELLED_DESCRIPTION: &str = "request cancelled";

    /// Description used when the server reports an error without a body.
    pub const UNSPECIFIED_SERVER_ERROR: &str = "server reported an error";
}

/// Environment variable names read by `from_env` constructors
pub mod env {
    pub const BASE_URL: &str = "DOCGEN_BASE_URL";
    pub const API_TOKEN: &str = "DOCGEN_API_TOKEN";
    pub const ORGANIZATION_ID: &str = "DOCGEN_ORGANIZATION_ID";
    pub const ORGANIZATION_HEADER: &str = "DOCGEN_ORGANIZATION_HEADER";
    pub const SESSION_TIMEOUT_SECS: &str = "DOCGEN_SESSION_TIMEOUT_SECS";
    pub const STREAM_DISABLE_COMPRESSION: &str = "DOCGEN_STREAM_DISABLE_COMPRESSION";
    pub const LOG_LEVEL: &str = "DOCGEN_LOG_LEVEL";
    pub const LOG_FORMAT: &str = "DOCGEN_LOG_FORMAT";
    pub const LOG_FILE: &str = "DOCGEN_LOG_FILE";
}
