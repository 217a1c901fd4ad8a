//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validated config → worker pool → filter list → metrics → listener
//!
//! Run:
//!     Accept up to max_requests connections → dispatch each to the pool
//!
//! Shutdown:
//!     Stop accepting → drain queued connections → stop workers → join
//! ```
//!
//! # Design Decisions
//! - Ordered startup: the listener binds last
//! - Shutdown is drain-based: no dispatched connection is abandoned

pub mod startup;

pub use startup::{run, Server, StartupError};
