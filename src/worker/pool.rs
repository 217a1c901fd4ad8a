//! Fixed-size worker pool.
//!
//! # Lifecycle
//! ```text
//! Accepting ──shutdown()──▶ Draining ──queue empty──▶ Stopped ──▶ join all
//! ```
//!
//! # Design Decisions
//! - Queue and phase live under one mutex, so "stop accepting" and
//!   "enqueue" can never interleave
//! - `not_empty` wakes idle workers; `drained` wakes the thread running
//!   shutdown once the last queued task has been taken
//! - Tasks run outside the lock; a panicking task is caught and logged,
//!   the worker keeps serving the queue

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use crate::observability::metrics;
use crate::worker::queue::{Task, WorkQueue};

/// Upper bound on the number of workers a pool may run.
pub const MAX_THREADS: usize = 200;

/// Errors raised while creating a pool.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("invalid pool size {requested}: must be between 1 and {max}")]
    InvalidSize { requested: usize, max: usize },

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Shutdown state machine of the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolPhase {
    /// New tasks are queued.
    Accepting,
    /// Dispatch is refused; queued tasks are still executed.
    Draining,
    /// Queue is empty and workers exit.
    Stopped,
}

#[derive(Debug)]
struct PoolState {
    queue: WorkQueue,
    phase: PoolPhase,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<PoolState>,
    not_empty: Condvar,
    drained: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().expect("work queue mutex poisoned")
    }
}

/// A pool of long-lived worker threads fed from a shared FIFO queue.
#[derive(Debug)]
pub struct WorkerPool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `size` workers. `size` must be within `1..=MAX_THREADS`.
    pub fn new(size: usize) -> Result<Self, PoolError> {
        if size == 0 || size > MAX_THREADS {
            return Err(PoolError::InvalidSize {
                requested: size,
                max: MAX_THREADS,
            });
        }

        let shared = Arc::new(Shared {
            state: Mutex::new(PoolState {
                queue: WorkQueue::new(),
                phase: PoolPhase::Accepting,
            }),
            not_empty: Condvar::new(),
            drained: Condvar::new(),
        });

        let mut pool = Self {
            shared,
            workers: Vec::with_capacity(size),
        };

        for index in 0..size {
            let shared = Arc::clone(&pool.shared);
            let spawned = thread::Builder::new()
                .name(format!("proxy-worker-{}", index))
                .spawn(move || worker_loop(index, shared));

            match spawned {
                Ok(handle) => pool.workers.push(handle),
                Err(e) => {
                    // Dropping the partial pool stops and joins the workers started so far.
                    tracing::error!(worker = index, error = %e, "Failed to spawn worker");
                    return Err(PoolError::Spawn(e));
                }
            }
        }

        tracing::info!(workers = size, "Worker pool started");
        Ok(pool)
    }

    /// Queue a routine for execution.
    ///
    /// Returns `false` without queuing anything once shutdown has begun.
    pub fn dispatch<F>(&self, routine: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        let depth = {
            let mut state = self.shared.lock();
            if state.phase != PoolPhase::Accepting {
                tracing::debug!(phase = ?state.phase, "Dispatch refused, pool is shutting down");
                return false;
            }
            state.queue.enqueue(Task::new(routine));
            state.queue.len()
        };

        metrics::set_queue_depth(depth);
        self.shared.not_empty.notify_one();
        true
    }

    /// Number of worker threads.
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Number of tasks waiting in the queue.
    pub fn queued(&self) -> usize {
        self.shared.lock().queue.len()
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> PoolPhase {
        self.shared.lock().phase
    }

    /// Refuse further dispatches. Tasks already queued still run.
    pub fn stop_accepting(&self) {
        begin_draining(&mut self.shared.lock());
    }

    /// Stop accepting, wait for the queue to drain, then stop and join every worker.
    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        {
            let mut state = self.shared.lock();
            begin_draining(&mut state);

            while !state.queue.is_empty() {
                state = self
                    .shared
                    .drained
                    .wait(state)
                    .expect("work queue mutex poisoned");
            }

            state.phase = PoolPhase::Stopped;
        }

        self.shared.not_empty.notify_all();

        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                tracing::error!("Worker thread terminated abnormally");
            }
        }

        tracing::info!("Worker pool stopped");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if !self.workers.is_empty() {
            self.stop_and_join();
        }
    }
}

fn begin_draining(state: &mut PoolState) {
    if state.phase == PoolPhase::Accepting {
        state.phase = PoolPhase::Draining;
        tracing::info!(queued = state.queue.len(), "Worker pool draining");
    }
}

fn worker_loop(index: usize, shared: Arc<Shared>) {
    tracing::trace!(worker = index, "Worker started");

    loop {
        let task = {
            let mut state = shared.lock();

            while state.queue.is_empty() && state.phase != PoolPhase::Stopped {
                state = shared
                    .not_empty
                    .wait(state)
                    .expect("work queue mutex poisoned");
            }

            if state.phase == PoolPhase::Stopped && state.queue.is_empty() {
                break;
            }

            let task = state.queue.dequeue();
            let depth = state.queue.len();

            if state.phase == PoolPhase::Draining && depth == 0 {
                shared.drained.notify_all();
            }

            metrics::set_queue_depth(depth);
            task
        };

        let Some(task) = task else { continue };

        match panic::catch_unwind(AssertUnwindSafe(|| task.run())) {
            Ok(()) => metrics::record_task_completed(),
            Err(_) => {
                metrics::record_task_panic();
                tracing::error!(worker = index, "Task panicked; worker continues");
            }
        }
    }

    tracing::trace!(worker = index, "Worker exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn rejects_out_of_range_sizes() {
        assert!(matches!(
            WorkerPool::new(0),
            Err(PoolError::InvalidSize { requested: 0, .. })
        ));
        assert!(matches!(
            WorkerPool::new(MAX_THREADS + 1),
            Err(PoolError::InvalidSize { .. })
        ));
    }

    #[test]
    fn runs_dispatched_tasks() {
        let pool = WorkerPool::new(4).unwrap();
        assert_eq!(pool.size(), 4);
        assert_eq!(pool.phase(), PoolPhase::Accepting);

        let (tx, rx) = mpsc::channel();
        for i in 0..16 {
            let tx = tx.clone();
            assert!(pool.dispatch(move || tx.send(i).unwrap()));
        }

        let mut seen: Vec<i32> = (0..16)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..16).collect::<Vec<_>>());

        pool.shutdown();
    }

    #[test]
    fn single_worker_serves_in_fifo_order() {
        let pool = WorkerPool::new(1).unwrap();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..10 {
            let order = Arc::clone(&order);
            pool.dispatch(move || order.lock().unwrap().push(i));
        }
        pool.shutdown();

        assert_eq!(*order.lock().unwrap(), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn panicking_task_does_not_kill_worker() {
        let pool = WorkerPool::new(1).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        pool.dispatch(|| panic!("task failure"));
        for _ in 0..3 {
            let counter = Arc::clone(&counter);
            pool.dispatch(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        pool.shutdown();

        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn dispatch_after_stop_accepting_is_refused() {
        let pool = WorkerPool::new(1).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        pool.stop_accepting();
        assert_eq!(pool.phase(), PoolPhase::Draining);

        let c = Arc::clone(&counter);
        assert!(!pool.dispatch(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(pool.queued(), 0);

        pool.shutdown();
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn drop_drains_queue() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let pool = WorkerPool::new(2).unwrap();
            for _ in 0..8 {
                let counter = Arc::clone(&counter);
                pool.dispatch(move || {
                    thread::sleep(Duration::from_millis(5));
                    counter.fetch_add(1, Ordering::SeqCst);
                });
            }
        }
        assert_eq!(counter.load(Ordering::SeqCst), 8);
    }
}
