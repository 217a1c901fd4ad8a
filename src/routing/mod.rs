//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! RequestHead (request line, Host header)
//!     → router.rs (validate, filter, resolve, pick port)
//!     → Route { host, clean_host, addr, port }
//!     → relay
//! ```
//!
//! # Design Decisions
//! - A forwarding proxy has exactly one destination per request: the Host header
//! - The address checked by the filter is the address the relay connects to

pub mod router;

pub use router::{port_of, route_request, Route, RouteError};
