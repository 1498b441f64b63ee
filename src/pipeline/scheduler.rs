//! Deferred execution.
//!
//! Components never run layout passes inline; they hand an "if-needed" task
//! to the host's [`Scheduler`]. Any number of invalidations between two
//! drains collapse into one pass because each task re-checks its flag.
//!
//! ```ignore
//! let queue = TaskQueue::new();
//! queue.invoke_later(Box::new(|| println!("later")));
//! assert_eq!(queue.run_pending(), 1);
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce()>;

/// Host capability to run work after the current call stack unwinds.
pub trait Scheduler {
    fn invoke_later(&self, task: Task);
}

/// FIFO scheduler drained explicitly by the host.
#[derive(Default)]
pub struct TaskQueue {
    tasks: RefCell<VecDeque<Task>>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.borrow().is_empty()
    }

    /// Run tasks until the queue is empty, including tasks queued by the
    /// tasks themselves. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            // The borrow ends before the task runs so it can queue more.
            let next = self.tasks.borrow_mut().pop_front();
            let Some(task) = next else {
                return ran;
            };
            task();
            ran += 1;
        }
    }
}

impl Scheduler for TaskQueue {
    fn invoke_later(&self, task: Task) {
        self.tasks.borrow_mut().push_back(task);
    }
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskQueue").field("pending", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_runs_in_submission_order() {
        let queue = TaskQueue::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for i in 0..3 {
            let log = log.clone();
            queue.invoke_later(Box::new(move || log.borrow_mut().push(i)));
        }
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.run_pending(), 3);
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_tasks_queued_while_draining_also_run() {
        let queue = Rc::new(TaskQueue::new());
        let hits = Rc::new(Cell::new(0));
        {
            let inner_queue = queue.clone();
            let hits = hits.clone();
            queue.invoke_later(Box::new(move || {
                hits.set(hits.get() + 1);
                let hits = hits.clone();
                inner_queue.invoke_later(Box::new(move || hits.set(hits.get() + 10)));
            }));
        }
        assert_eq!(queue.run_pending(), 2);
        assert_eq!(hits.get(), 11);
    }
}
