use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use herd_core::{ClusterConfig, HerdError, WorkerId};
use tracing::info;

use crate::executor::TaskExecutor;
use crate::metrics::{ClusterMetrics, ScaleEvent, WorkerMetrics};
use crate::types::{ScaleState, WorkerStatus};
use crate::worker::Worker;

/// A self-scaling pool of workers.
///
/// Workers are kept in creation order with ids `1..=n`; the set only grows.
/// Two separate locks guard cluster state: `workers` is read briefly to take
/// a snapshot and written only when a worker is appended, while `scale` is
/// held for the whole autoscale evaluation. Neither is held while scanning
/// loads or enqueueing. `scaled` mirrors `scale` so submissions can skip the
/// lock once the single scale-up has happened.
pub struct Cluster {
    pub(super) config: ClusterConfig,
    pub(super) executor: Arc<dyn TaskExecutor>,
    pub(super) workers: RwLock<Vec<Arc<Worker>>>,
    pub(super) scale: Mutex<ScaleState>,
    /// Set under `scale` when a worker is added.
    pub(super) scaled: AtomicBool,
    pub(super) scale_events: RwLock<Vec<ScaleEvent>>,
    pub(super) submitted: AtomicU64,
    pub(super) rejected: AtomicU64,
    /// Whether new workers get their loop started on creation.
    pub(super) autostart: AtomicBool,
    /// Set under `scale` once submissions are refused.
    pub(super) shut_down: AtomicBool,
    /// Set once every worker has been joined.
    pub(super) joined: AtomicBool,
}

impl Cluster {
    /// Validate `config` and start `initial_workers` workers.
    pub fn new(config: ClusterConfig, executor: Arc<dyn TaskExecutor>) -> Result<Self, HerdError> {
        Self::build(config, executor, true)
    }

    pub(crate) fn build(
        config: ClusterConfig,
        executor: Arc<dyn TaskExecutor>,
        autostart: bool,
    ) -> Result<Self, HerdError> {
        config.validate()?;

        let mut workers: Vec<Arc<Worker>> = Vec::with_capacity(config.initial_workers);
        for id in 1..=config.initial_workers as WorkerId {
            let worker = Arc::new(Worker::new(id, Arc::clone(&executor), config.idle_interval()));
            if autostart {
                if let Err(e) = worker.start() {
                    for started in &workers {
                        started.stop();
                    }
                    return Err(e);
                }
            }
            workers.push(worker);
        }

        info!(
            workers = config.initial_workers,
            load_threshold = config.load_threshold,
            autoscale = ?config.autoscale,
            "cluster started"
        );

        Ok(Self {
            config,
            executor,
            workers: RwLock::new(workers),
            scale: Mutex::new(ScaleState::NotYetScaled),
            scaled: AtomicBool::new(false),
            scale_events: RwLock::new(Vec::new()),
            submitted: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            autostart: AtomicBool::new(autostart),
            shut_down: AtomicBool::new(false),
            joined: AtomicBool::new(false),
        })
    }

    /// Start every worker loop of a cluster built without autostart.
    #[cfg(test)]
    pub(crate) fn start_workers(&self) -> Result<(), HerdError> {
        self.autostart.store(true, Ordering::SeqCst);
        for worker in self.snapshot() {
            worker.start()?;
        }
        Ok(())
    }

    /// Current worker list. The read lock is released before returning.
    pub(super) fn snapshot(&self) -> Vec<Arc<Worker>> {
        self.workers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    pub fn worker_count(&self) -> usize {
        self.workers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Look up a worker by id.
    pub fn worker(&self, id: WorkerId) -> Option<Arc<Worker>> {
        self.snapshot().into_iter().find(|w| w.id() == id)
    }

    pub fn scale_state(&self) -> ScaleState {
        *self.scale.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Per-worker load snapshot in id order. Values may be slightly stale.
    pub fn status(&self) -> Vec<WorkerStatus> {
        self.snapshot()
            .iter()
            .map(|w| WorkerStatus {
                worker_id: w.id(),
                load: w.load(),
            })
            .collect()
    }

    /// Snapshot of the cluster metrics.
    pub fn metrics(&self) -> ClusterMetrics {
        let workers = self
            .snapshot()
            .iter()
            .map(|w| WorkerMetrics {
                worker_id: w.id(),
                load: w.load(),
                dequeued: w.dequeued(),
                completed: w.completed(),
            })
            .collect();

        ClusterMetrics {
            submitted: self.submitted.load(Ordering::SeqCst),
            rejected: self.rejected.load(Ordering::SeqCst),
            workers,
            scale_state: self.scale_state(),
            scale_events: self
                .scale_events
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        }
    }
}

impl std::fmt::Debug for Cluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cluster")
            .field("config", &self.config)
            .field("workers", &self.status())
            .field("scale_state", &self.scale_state())
            .finish()
    }
}
