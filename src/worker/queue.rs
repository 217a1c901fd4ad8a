//! FIFO work queue.
//!
//! # Responsibilities
//! - Hold pending tasks in dispatch order
//! - Hand ownership of each task to exactly one dequeuer
//!
//! # Design Decisions
//! - No internal locking: the pool keeps the queue inside its mutex, so
//!   every call here already runs under the pool lock
//! - Backed by `VecDeque`; the length is the deque's own length, so the
//!   size counter can never drift from the stored tasks

use std::collections::VecDeque;
use std::fmt;

/// A unit of work executed by a pool worker.
///
/// The closure owns whatever argument it needs; it is dropped right after it runs.
pub struct Task {
    routine: Box<dyn FnOnce() + Send + 'static>,
}

impl Task {
    /// Wrap a routine into a task.
    pub fn new<F>(routine: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            routine: Box::new(routine),
        }
    }

    /// Consume the task, running its routine on the current thread.
    pub fn run(self) {
        (self.routine)()
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").finish_non_exhaustive()
    }
}

/// Ordered sequence of pending tasks.
#[derive(Debug, Default)]
pub struct WorkQueue {
    tasks: VecDeque<Task>,
}

impl WorkQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a task at the tail.
    pub fn enqueue(&mut self, task: Task) {
        self.tasks.push_back(task);
    }

    /// Pop the task at the head, or `None` when the queue is empty.
    pub fn dequeue(&mut self) -> Option<Task> {
        self.tasks.pop_front()
    }

    /// Number of queued tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recording_task(log: &Arc<Mutex<Vec<u32>>>, value: u32) -> Task {
        let log = Arc::clone(log);
        Task::new(move || log.lock().unwrap().push(value))
    }

    #[test]
    fn dequeue_on_empty_returns_none() {
        let mut queue = WorkQueue::new();
        assert!(queue.dequeue().is_none());
        assert_eq!(queue.len(), 0);
        assert!(queue.is_empty());
    }

    #[test]
    fn preserves_fifo_order_with_interleaving() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut queue = WorkQueue::new();

        queue.enqueue(recording_task(&log, 1));
        queue.enqueue(recording_task(&log, 2));
        queue.dequeue().unwrap().run();
        queue.enqueue(recording_task(&log, 3));
        assert_eq!(queue.len(), 2);

        while let Some(task) = queue.dequeue() {
            task.run();
        }

        assert_eq!(*log.lock().unwrap(), vec![1, 2, 3]);
        assert!(queue.is_empty());
    }

    #[test]
    fn size_tracks_enqueues_minus_dequeues() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut queue = WorkQueue::new();
        let mut expected = 0usize;

        for round in 0..20u32 {
            queue.enqueue(recording_task(&log, round));
            expected += 1;
            if round % 3 == 0 {
                assert!(queue.dequeue().is_some());
                expected -= 1;
            }
            assert_eq!(queue.len(), expected);
        }

        // Extra dequeues never drive the size below zero.
        for _ in 0..40 {
            queue.dequeue();
        }
        assert_eq!(queue.len(), 0);
    }
}
