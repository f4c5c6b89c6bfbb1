#![forbid(unsafe_code)]

//! Single-threaded deferred task queue.
//!
//! The binding engine has exactly one asynchronous point: the one deferred
//! resolution retry a directive may schedule. [`TaskQueue`] is the explicit,
//! process-owned stand-in for a host main loop: tasks are posted as boxed
//! one-shot closures and run, in FIFO order, when the owner drains the
//! queue. There is no cancellation — a task that has become irrelevant is
//! expected to no-op when it runs.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

type Task = Box<dyn FnOnce()>;

/// A shared handle to a single-threaded FIFO of one-shot tasks.
///
/// Cloning clones the handle; all clones feed the same queue.
#[derive(Clone, Default)]
pub struct TaskQueue {
    tasks: Rc<RefCell<VecDeque<Task>>>,
}

impl TaskQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        TaskQueue::default()
    }

    /// Append a task to run on the next drain.
    pub fn post(&self, task: impl FnOnce() + 'static) {
        self.tasks.borrow_mut().push_back(Box::new(task));
    }

    /// Run queued tasks in FIFO order until the queue is empty. Tasks
    /// posted while draining run in the same drain.
    pub fn drain(&self) {
        loop {
            let task = self.tasks.borrow_mut().pop_front();
            match task {
                Some(task) => task(),
                None => break,
            }
        }
    }

    /// Number of tasks currently pending.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.borrow().is_empty()
    }
}

impl std::fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskQueue")
            .field("pending", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn drains_in_fifo_order() {
        let queue = TaskQueue::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        for n in 0..3 {
            let order = Rc::clone(&order);
            queue.post(move || order.borrow_mut().push(n));
        }
        assert_eq!(queue.len(), 3);

        queue.drain();
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
        assert!(queue.is_empty());
    }

    #[test]
    fn tasks_posted_while_draining_run_in_same_drain() {
        let queue = TaskQueue::new();
        let ran = Rc::new(Cell::new(false));

        let inner_queue = queue.clone();
        let r = Rc::clone(&ran);
        queue.post(move || {
            inner_queue.post(move || r.set(true));
        });

        queue.drain();
        assert!(ran.get());
    }

    #[test]
    fn clones_share_the_queue() {
        let queue = TaskQueue::new();
        let other = queue.clone();
        let ran = Rc::new(Cell::new(0));

        let r = Rc::clone(&ran);
        other.post(move || r.set(r.get() + 1));
        assert_eq!(queue.len(), 1);

        queue.drain();
        assert_eq!(ran.get(), 1);
        assert!(other.is_empty());
    }

    #[test]
    fn drain_on_empty_queue_is_a_no_op() {
        let queue = TaskQueue::new();
        queue.drain();
        assert!(queue.is_empty());
    }
}
