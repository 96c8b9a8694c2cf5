//! Test executors shared by the worker and cluster tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use herd_core::{Priority, Task, WorkerId};

use crate::executor::{ExecuteError, TaskExecutor};

/// Poll `cond` every few milliseconds until it holds or `timeout` passes.
pub(crate) fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if cond() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(2));
    }
}

/// Records every task in execution order.
#[derive(Default)]
pub(crate) struct RecordingExecutor {
    log: Mutex<Vec<(WorkerId, Task)>>,
}

impl RecordingExecutor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn executed(&self) -> Vec<(WorkerId, Task)> {
        self.log.lock().unwrap().clone()
    }

    pub(crate) fn priorities_for(&self, worker: WorkerId) -> Vec<Priority> {
        self.executed()
            .into_iter()
            .filter(|(w, _)| *w == worker)
            .map(|(_, t)| t.priority)
            .collect()
    }
}

impl TaskExecutor for RecordingExecutor {
    fn execute(&self, worker: WorkerId, task: &Task) -> Result<(), ExecuteError> {
        self.log.lock().unwrap().push((worker, *task));
        Ok(())
    }
}

/// Blocks every execution until [`GateExecutor::open`] is called and reports
/// each task id as it starts.
pub(crate) struct GateExecutor {
    open: Mutex<bool>,
    opened: Condvar,
    started_tx: Mutex<Sender<i64>>,
    started_rx: Mutex<Receiver<i64>>,
}

impl GateExecutor {
    pub(crate) fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            open: Mutex::new(false),
            opened: Condvar::new(),
            started_tx: Mutex::new(tx),
            started_rx: Mutex::new(rx),
        }
    }

    pub(crate) fn open(&self) {
        *self.open.lock().unwrap() = true;
        self.opened.notify_all();
    }

    /// Id of the next task to begin executing, if one starts within `timeout`.
    pub(crate) fn wait_started(&self, timeout: Duration) -> Option<i64> {
        self.started_rx.lock().unwrap().recv_timeout(timeout).ok()
    }
}

impl TaskExecutor for GateExecutor {
    fn execute(&self, _worker: WorkerId, task: &Task) -> Result<(), ExecuteError> {
        let _ = self.started_tx.lock().unwrap().send(task.id);
        let guard = self.open.lock().unwrap();
        let _guard = self.opened.wait_while(guard, |open| !*open).unwrap();
        Ok(())
    }
}

/// Fails every even task id and panics on id 13.
#[derive(Default)]
pub(crate) struct FailingExecutor {
    attempts: AtomicUsize,
}

impl FailingExecutor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl TaskExecutor for FailingExecutor {
    fn execute(&self, _worker: WorkerId, task: &Task) -> Result<(), ExecuteError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if task.id == 13 {
            panic!("simulated executor panic");
        }
        if task.id % 2 == 0 {
            return Err(ExecuteError::Failed(format!("task {} rejected", task.id)));
        }
        Ok(())
    }
}
