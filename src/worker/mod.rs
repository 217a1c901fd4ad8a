//! Worker subsystem.
//!
//! # Data Flow
//! ```text
//! Acceptor
//!     → pool.rs (dispatch under the queue lock)
//!     → queue.rs (FIFO of pending tasks)
//!     → worker thread (dequeue, run outside the lock)
//! ```

pub mod pool;
pub mod queue;

pub use pool::{PoolError, PoolPhase, WorkerPool, MAX_THREADS};
pub use queue::{Task, WorkQueue};
