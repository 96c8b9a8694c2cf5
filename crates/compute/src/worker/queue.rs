//! Priority-ordered task queue with a lock-free load counter.

use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use herd_core::Task;

/// Heap entry ordered by priority alone; the most urgent (lowest value) task
/// compares greatest. Equal priorities compare equal, so their relative
/// order out of the heap is unspecified.
#[derive(Debug, Clone, Copy)]
struct Queued(Task);

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.0.priority == other.0.priority
    }
}

impl Eq for Queued {}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for Queued {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        other.0.priority.cmp(&self.0.priority)
    }
}

/// A worker's private queue.
///
/// `load` is only modified while the heap lock is held, so at every unlock it
/// equals the heap length. Readers of [`TaskQueue::load`] skip the lock and
/// may see a value that is a few operations old.
#[derive(Debug, Default)]
pub(crate) struct TaskQueue {
    heap: Mutex<BinaryHeap<Queued>>,
    load: AtomicUsize,
    dequeued: AtomicU64,
}

impl TaskQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn heap(&self) -> MutexGuard<'_, BinaryHeap<Queued>> {
        self.heap.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn push(&self, task: Task) {
        let mut heap = self.heap();
        heap.push(Queued(task));
        self.load.fetch_add(1, Ordering::SeqCst);
    }

    /// Remove the most urgent task, if any.
    pub(crate) fn pop(&self) -> Option<Task> {
        let mut heap = self.heap();
        let task = heap.pop()?.0;
        self.load.fetch_sub(1, Ordering::SeqCst);
        self.dequeued.fetch_add(1, Ordering::SeqCst);
        Some(task)
    }

    /// Empty the queue, returning whatever was left in priority order.
    pub(crate) fn drain(&self) -> Vec<Task> {
        let mut heap = self.heap();
        let drained: Vec<Task> = std::iter::from_fn(|| heap.pop().map(|q| q.0)).collect();
        self.load.fetch_sub(drained.len(), Ordering::SeqCst);
        drained
    }

    pub(crate) fn load(&self) -> usize {
        self.load.load(Ordering::SeqCst)
    }

    /// Tasks removed by `pop` over the queue's lifetime.
    pub(crate) fn dequeued(&self) -> u64 {
        self.dequeued.load(Ordering::SeqCst)
    }
}
