//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → limits.rs (request-line token bounds, accepted method/version)
//!     → access_control.rs (hostname / CIDR filter list)
//!     → Pass to relay
//! ```
//!
//! # Design Decisions
//! - Fail closed: a host that cannot be resolved is never forwarded
//! - The filter list is immutable after startup

pub mod access_control;
pub mod limits;

pub use access_control::{FilterError, FilterList, FilterRule, FilterVerdict};
