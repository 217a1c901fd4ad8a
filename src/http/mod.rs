//! HTTP/1.x handling subsystem.
//!
//! # Data Flow
//! ```text
//! Accepted TCP connection
//!     → server.rs (per-connection pipeline, outcome logging)
//!     → reader.rs (read until \r\n\r\n, buffer doubling, receive timeout)
//!     → request.rs (tokenize head, Connection: close rewrite)
//!     → [routing layer validates and picks the destination]
//!     → relay.rs (forward request, stream response back)
//!     → response.rs (error responses when any stage refuses)
//! ```

pub mod reader;
pub mod relay;
pub mod request;
pub mod response;
pub mod server;

pub use request::{ParseError, RequestHead};
pub use response::ErrorKind;
pub use server::{handle_connection, HandlerSettings, Outcome};
