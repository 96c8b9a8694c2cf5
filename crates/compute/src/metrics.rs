use chrono::{DateTime, Utc};
use serde::Serialize;

use herd_core::WorkerId;

use crate::types::ScaleState;

/// A worker added by the autoscaler.
#[derive(Debug, Clone, Serialize)]
pub struct ScaleEvent {
    pub at: DateTime<Utc>,
    pub worker_id: WorkerId,
    /// Average load that crossed the trigger.
    pub average_load: f64,
    /// Worker count after the addition.
    pub worker_count: usize,
}

/// Per-worker counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerMetrics {
    pub worker_id: WorkerId,
    pub load: usize,
    pub dequeued: u64,
    pub completed: u64,
}

/// Cluster operational metrics exposed to reporters.
///
/// Counters are read one worker at a time without a cluster-wide lock, so a
/// snapshot taken under traffic is only approximately consistent.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterMetrics {
    /// Tasks accepted by `submit`.
    pub submitted: u64,
    /// Tasks refused because the cluster was shutting down.
    pub rejected: u64,
    pub workers: Vec<WorkerMetrics>,
    pub scale_state: ScaleState,
    pub scale_events: Vec<ScaleEvent>,
}

impl ClusterMetrics {
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Sum of all queue lengths.
    pub fn total_load(&self) -> usize {
        self.workers.iter().map(|w| w.load).sum()
    }

    pub fn total_dequeued(&self) -> u64 {
        self.workers.iter().map(|w| w.dequeued).sum()
    }

    pub fn total_completed(&self) -> u64 {
        self.workers.iter().map(|w| w.completed).sum()
    }

    pub fn average_load(&self) -> f64 {
        if self.workers.is_empty() {
            return 0.0;
        }
        self.total_load() as f64 / self.workers.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn worker(id: WorkerId, load: usize, dequeued: u64, completed: u64) -> WorkerMetrics {
        WorkerMetrics { worker_id: id, load, dequeued, completed }
    }

    #[test]
    fn aggregates_across_workers() {
        let m = ClusterMetrics {
            submitted: 12,
            rejected: 0,
            workers: vec![worker(1, 2, 4, 3), worker(2, 1, 5, 5)],
            scale_state: ScaleState::NotYetScaled,
            scale_events: Vec::new(),
        };
        assert_eq!(m.worker_count(), 2);
        assert_eq!(m.total_load(), 3);
        assert_eq!(m.total_dequeued(), 9);
        assert_eq!(m.total_completed(), 8);
        assert!((m.average_load() - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn average_of_no_workers_is_zero() {
        let m = ClusterMetrics {
            submitted: 0,
            rejected: 0,
            workers: Vec::new(),
            scale_state: ScaleState::NotYetScaled,
            scale_events: Vec::new(),
        };
        assert_eq!(m.average_load(), 0.0);
    }
}
