use serde::{Deserialize, Serialize};

use herd_core::WorkerId;

/// Load snapshot for one worker, as shown by status reporters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerStatus {
    pub worker_id: WorkerId,
    pub load: usize,
}

/// Whether the cluster has already used its scale-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScaleState {
    #[default]
    NotYetScaled,
    Scaled,
}

/// Outcome of one autoscale evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum ScalingDecision {
    /// Average load is at or below the trigger.
    None { average_load: f64 },
    /// Average load exceeds the trigger; add one worker.
    ScaleUp { average_load: f64 },
}

/// Tasks thrown away by a worker at shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorkerShutdown {
    pub worker_id: WorkerId,
    pub discarded: usize,
}

/// Result of stopping a cluster. Discarded tasks are gone for good.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShutdownReport {
    pub workers: Vec<WorkerShutdown>,
}

impl ShutdownReport {
    pub fn total_discarded(&self) -> usize {
        self.workers.iter().map(|w| w.discarded).sum()
    }
}
