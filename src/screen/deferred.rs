use std::fmt;

use crossbeam_queue::SegQueue;

type DeferredTask<T> = Box<dyn FnOnce(&mut T) + Send>;

/// A FIFO queue of configuration tasks whose target does not exist yet.
///
/// Screens enqueue closures while a section still shows a placeholder; once
/// real content is available, the owner drains the queue and each task runs
/// against it in the order it was deferred. Enqueueing only needs `&self`,
/// so background producers can defer work while the UI thread owns the state.
pub struct DeferredTasks<T> {
    queue: SegQueue<DeferredTask<T>>,
}

impl<T> DeferredTasks<T> {
    pub fn new() -> Self {
        Self {
            queue: SegQueue::new(),
        }
    }

    /// Enqueues `task` to run once the target is available.
    pub fn defer(&self, task: impl FnOnce(&mut T) + Send + 'static) {
        self.queue.push(Box::new(task));
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Runs all pending tasks against `target`, in enqueue order,
    /// and returns how many ran.
    ///
    /// Tasks deferred *by* a running task are picked up within the same drain.
    pub fn run_pending(&self, target: &mut T) -> usize {
        let mut ran = 0;
        while let Some(task) = self.queue.pop() {
            task(target);
            ran += 1;
        }
        ran
    }
}

impl<T> Default for DeferredTasks<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for DeferredTasks<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredTasks")
            .field("pending", &self.queue.len())
            .finish()
    }
}
