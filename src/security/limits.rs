//! Request limits.
//!
//! # Responsibilities
//! - Bound the request-line tokens (method, target, version)
//! - Name the protocol literals the validator accepts
//!
//! # Design Decisions
//! - Oversized tokens are treated as a malformed request (400)

/// Longest accepted request method.
pub const MAX_METHOD_LEN: usize = 63;

/// Longest accepted request target.
pub const MAX_TARGET_LEN: usize = 1023;

/// Longest accepted HTTP version token.
pub const MAX_VERSION_LEN: usize = 63;

/// HTTP versions the proxy forwards.
pub const SUPPORTED_VERSIONS: [&str; 2] = ["HTTP/1.0", "HTTP/1.1"];

/// Every forwarded request starts with exactly these bytes.
pub const REQUIRED_METHOD_PREFIX: &str = "GET ";
