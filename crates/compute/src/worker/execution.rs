use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::Ordering;

use herd_core::Task;
use tracing::{debug, error, info, warn};

use super::Shared;

impl Shared {
    /// Worker loop. Runs on the worker thread until stop is requested.
    ///
    /// Polls rather than waiting for arrivals: an empty queue costs one
    /// `idle_interval` sleep before the next look.
    pub(super) fn run(&self) {
        info!(worker = self.id, "worker started");

        while !self.stop.is_requested() {
            // The queue lock is released before execution starts.
            match self.queue.pop() {
                Some(task) => self.execute(&task),
                None => {
                    self.stop.wait_timeout(self.idle_interval);
                }
            }
        }

        debug!(worker = self.id, "worker loop exited");
    }

    fn execute(&self, task: &Task) {
        info!(
            worker = self.id,
            task = task.id,
            priority = task.priority,
            "processing task"
        );

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.executor.execute(self.id, task)));
        match outcome {
            Ok(Ok(())) => debug!(worker = self.id, task = task.id, "task completed"),
            Ok(Err(e)) => warn!(worker = self.id, task = task.id, error = %e, "task failed"),
            Err(_) => error!(worker = self.id, task = task.id, "executor panicked"),
        }

        self.completed.fetch_add(1, Ordering::SeqCst);
    }
}
