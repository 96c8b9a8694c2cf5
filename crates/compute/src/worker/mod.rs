//! A single worker: one private priority queue drained by one dedicated thread.
//!
//! Split into focused submodules:
//! - `queue`: heap + atomic load counter
//! - `signal`: stop flag the idle wait can be woken by
//! - `execution`: the polling loop run on the worker thread

mod execution;
mod queue;
mod signal;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use herd_core::{HerdError, Task, WorkerId};
use tracing::{error, info, warn};

use crate::executor::TaskExecutor;

use self::queue::TaskQueue;
use self::signal::StopSignal;

/// State shared between a [`Worker`] handle and its loop thread.
struct Shared {
    id: WorkerId,
    queue: TaskQueue,
    stop: StopSignal,
    completed: AtomicU64,
    idle_interval: Duration,
    executor: Arc<dyn TaskExecutor>,
}

/// Handle to one worker: its queue plus the thread draining it.
///
/// Ids are assigned by the owning cluster. The loop is started separately
/// from construction so a worker can be filled before it runs.
pub struct Worker {
    shared: Arc<Shared>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Worker {
    /// Create a worker without starting its loop.
    pub fn new(id: WorkerId, executor: Arc<dyn TaskExecutor>, idle_interval: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                id,
                queue: TaskQueue::new(),
                stop: StopSignal::new(),
                completed: AtomicU64::new(0),
                idle_interval,
                executor,
            }),
            handle: Mutex::new(None),
        }
    }

    /// Create a worker and start its loop on a dedicated thread.
    pub fn spawn(
        id: WorkerId,
        executor: Arc<dyn TaskExecutor>,
        idle_interval: Duration,
    ) -> Result<Self, HerdError> {
        let worker = Self::new(id, executor, idle_interval);
        worker.start()?;
        Ok(worker)
    }

    /// Start the loop thread. No-op if it is already running.
    pub fn start(&self) -> Result<(), HerdError> {
        let mut handle = self.handle.lock().unwrap_or_else(PoisonError::into_inner);
        if handle.is_some() {
            return Ok(());
        }
        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name(format!("herd-worker-{}", self.shared.id))
            .spawn(move || shared.run())
            .map_err(|source| HerdError::Spawn {
                worker: self.shared.id,
                source,
            })?;
        *handle = Some(spawned);
        Ok(())
    }

    pub fn id(&self) -> WorkerId {
        self.shared.id
    }

    /// Append a task. Never blocks on execution.
    pub fn enqueue(&self, task: Task) {
        self.shared.queue.push(task);
    }

    /// Number of queued tasks, read without taking the queue lock.
    pub fn load(&self) -> usize {
        self.shared.queue.load()
    }

    /// Tasks taken off the queue by the loop, including any in flight.
    pub fn dequeued(&self) -> u64 {
        self.shared.queue.dequeued()
    }

    /// Tasks whose execution has finished, successfully or not.
    pub fn completed(&self) -> u64 {
        self.shared.completed.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        let started = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some();
        started && !self.shared.stop.is_requested()
    }

    /// Ask the loop to exit at its next iteration without waiting for it.
    pub fn request_stop(&self) {
        self.shared.stop.request();
    }

    /// Stop the loop, wait for it, and discard whatever is still queued.
    ///
    /// A task already executing runs to completion first. Returns the number
    /// of discarded tasks; they are not executed or handed back.
    pub fn stop(&self) -> usize {
        self.request_stop();

        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!(worker = self.shared.id, "worker thread panicked");
            }
            info!(worker = self.shared.id, "worker stopped");
        }

        let discarded = self.shared.queue.drain();
        if !discarded.is_empty() {
            warn!(
                worker = self.shared.id,
                discarded = discarded.len(),
                "discarding queued tasks on stop"
            );
        }
        discarded.len()
    }
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("id", &self.shared.id)
            .field("load", &self.load())
            .field("completed", &self.completed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::testing::{wait_until, FailingExecutor, GateExecutor, RecordingExecutor};

    const IDLE: Duration = Duration::from_millis(5);

    #[test]
    fn enqueue_raises_load_without_a_running_loop() {
        let worker = Worker::new(1, Arc::new(RecordingExecutor::new()), IDLE);
        worker.enqueue(Task::new(1, 3));
        worker.enqueue(Task::new(2, 1));
        assert_eq!(worker.load(), 2);
        assert_eq!(worker.dequeued(), 0);
        assert!(!worker.is_running());
    }

    #[test]
    fn executes_backlog_in_priority_order() {
        let recorder = Arc::new(RecordingExecutor::new());
        let worker = Worker::new(1, recorder.clone(), IDLE);
        for (id, priority) in [(1, 5), (2, 1), (3, 4), (4, 2), (5, 3)] {
            worker.enqueue(Task::new(id, priority));
        }

        worker.start().unwrap();
        assert!(wait_until(Duration::from_secs(5), || worker.completed() == 5));

        assert_eq!(recorder.priorities_for(1), vec![1, 2, 3, 4, 5]);
        assert_eq!(worker.load(), 0);
        assert_eq!(worker.stop(), 0);
    }

    #[test]
    fn picks_up_tasks_enqueued_while_idle() {
        let recorder = Arc::new(RecordingExecutor::new());
        let worker = Worker::spawn(4, recorder.clone(), IDLE).unwrap();
        assert!(worker.is_running());

        worker.enqueue(Task::new(10, 0));
        assert!(wait_until(Duration::from_secs(5), || worker.completed() == 1));
        assert_eq!(recorder.executed(), vec![(4, Task::new(10, 0))]);
        worker.stop();
    }

    #[test]
    fn stop_discards_queued_tasks() {
        let recorder = Arc::new(RecordingExecutor::new());
        let worker = Worker::new(1, recorder.clone(), IDLE);
        for id in 0..5 {
            worker.enqueue(Task::new(id, id));
        }

        assert_eq!(worker.stop(), 5);
        assert_eq!(worker.load(), 0);
        assert!(recorder.executed().is_empty());
    }

    #[test]
    fn stop_lets_in_flight_task_finish_and_discards_the_rest() {
        let gate = Arc::new(GateExecutor::new());
        let worker = Worker::spawn(2, gate.clone(), IDLE).unwrap();

        worker.enqueue(Task::new(100, 0));
        assert_eq!(gate.wait_started(Duration::from_secs(5)), Some(100));

        for id in 0..5 {
            worker.enqueue(Task::new(id, 1));
        }
        assert_eq!(worker.load(), 5);

        // Stop is observed only after the blocked task returns.
        worker.request_stop();
        gate.open();

        assert_eq!(worker.stop(), 5);
        assert_eq!(worker.completed(), 1);
        assert_eq!(worker.dequeued(), 1);
    }

    #[test]
    fn execution_failures_do_not_end_the_loop() {
        let exec = Arc::new(FailingExecutor::new());
        let worker = Worker::new(3, exec.clone(), IDLE);
        // Even ids fail, id 13 panics.
        for id in 0..20 {
            worker.enqueue(Task::new(id, id));
        }
        worker.start().unwrap();

        assert!(wait_until(Duration::from_secs(5), || worker.completed() == 20));
        assert_eq!(exec.attempts(), 20);
        assert!(worker.is_running());
        worker.stop();
    }

    #[test]
    fn stop_wakes_an_idle_worker_promptly() {
        let worker = Worker::spawn(
            1,
            Arc::new(RecordingExecutor::new()),
            Duration::from_secs(30),
        )
        .unwrap();
        thread::sleep(Duration::from_millis(20));

        let start = Instant::now();
        worker.stop();
        assert!(start.elapsed() < Duration::from_secs(5));
        assert!(!worker.is_running());
    }

    #[test]
    fn start_twice_is_a_no_op() {
        let worker = Worker::new(1, Arc::new(RecordingExecutor::new()), IDLE);
        worker.start().unwrap();
        worker.start().unwrap();
        assert!(worker.is_running());
        worker.stop();
    }
}
