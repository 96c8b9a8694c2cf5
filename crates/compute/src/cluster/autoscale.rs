use std::sync::atomic::Ordering;
use std::sync::{Arc, PoisonError};

use chrono::Utc;
use herd_core::{AutoscaleMode, WorkerId};
use tracing::{debug, error, info};

use crate::metrics::ScaleEvent;
use crate::types::{ScaleState, ScalingDecision};
use crate::worker::Worker;

use super::Cluster;

/// Decide whether the observed loads call for another worker.
///
/// Scales up when the mean load is strictly greater than `trigger`
/// (`load_threshold * initial_workers`). No loads means no decision to make.
pub fn decide(loads: &[usize], trigger: f64) -> ScalingDecision {
    if loads.is_empty() {
        return ScalingDecision::None { average_load: 0.0 };
    }
    let total: usize = loads.iter().sum();
    let average_load = total as f64 / loads.len() as f64;
    if average_load > trigger {
        ScalingDecision::ScaleUp { average_load }
    } else {
        ScalingDecision::None { average_load }
    }
}

impl Cluster {
    /// Evaluate cluster load and add at most one worker.
    ///
    /// Runs under the scale lock. In `Once` mode the state is checked again
    /// here so that racing submits cannot add a second worker; once `Scaled`,
    /// evaluation never happens again for the life of the cluster. Nothing is
    /// added after shutdown has been signalled.
    pub(super) fn evaluate_load(&self) {
        let mut state = self.scale.lock().unwrap_or_else(PoisonError::into_inner);
        if self.shut_down.load(Ordering::SeqCst) {
            return;
        }
        if self.config.autoscale == AutoscaleMode::Once && *state == ScaleState::Scaled {
            return;
        }

        let loads: Vec<usize> = self.snapshot().iter().map(|w| w.load()).collect();
        let average_load = match decide(&loads, self.config.scale_trigger()) {
            ScalingDecision::None { average_load } => {
                debug!(average_load, "cluster load below scale trigger");
                return;
            }
            ScalingDecision::ScaleUp { average_load } => average_load,
        };

        // Only this function appends, and it holds the scale lock.
        let id = loads.len() as WorkerId + 1;
        let worker = Arc::new(Worker::new(
            id,
            Arc::clone(&self.executor),
            self.config.idle_interval(),
        ));
        if self.autostart.load(Ordering::SeqCst) {
            if let Err(e) = worker.start() {
                error!(worker = id, error = %e, "failed to start worker, skipping scale-up");
                return;
            }
        }

        let worker_count = {
            let mut workers = self.workers.write().unwrap_or_else(PoisonError::into_inner);
            workers.push(worker);
            workers.len()
        };
        *state = ScaleState::Scaled;
        self.scaled.store(true, Ordering::SeqCst);

        self.scale_events
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ScaleEvent {
                at: Utc::now(),
                worker_id: id,
                average_load,
                worker_count,
            });

        info!(
            worker = id,
            average_load,
            workers = worker_count,
            "added worker due to high load"
        );
    }
}
