//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (blocking accept)
//!     → acceptor.rs (request limit, dispatch to worker pool)
//!     → connection.rs (per-connection context, teardown on drop)
//!     → Hand off to HTTP layer
//!
//! Outgoing:
//!     resolve.rs (Host value → first IPv4 address)
//! ```
//!
//! # Design Decisions
//! - One blocking accept loop; all per-connection work happens on workers
//! - The accept loop ends after a fixed number of connections or on the
//!   first accept error

pub mod acceptor;
pub mod connection;
pub mod listener;
pub mod resolve;

pub use acceptor::{AcceptEnd, AcceptReport, Acceptor};
pub use connection::{ConnectionContext, ConnectionId};
pub use listener::{Listener, ListenerError};
