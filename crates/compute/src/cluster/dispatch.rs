use std::sync::atomic::Ordering;

use herd_core::{AutoscaleMode, Task};
use tracing::{debug, warn};

use super::Cluster;

/// Index and load of the least-loaded entry.
///
/// Only a strictly smaller load replaces the current pick, so the first
/// (lowest-id) worker wins ties. `None` for an empty input.
pub fn least_loaded(loads: impl IntoIterator<Item = usize>) -> Option<(usize, usize)> {
    let mut best: Option<(usize, usize)> = None;
    for (idx, load) in loads.into_iter().enumerate() {
        match best {
            Some((_, min)) if load >= min => {}
            _ => best = Some((idx, load)),
        }
    }
    best
}

impl Cluster {
    /// Route `task` to the least-loaded worker.
    ///
    /// Loads are read one worker at a time with no cluster-wide lock, so two
    /// concurrent submits can pick the same worker. That imbalance corrects
    /// itself on later submissions. Never fails and never waits on task
    /// execution. A submit after shutdown is logged and dropped.
    pub fn submit(&self, task: Task) {
        if self.shut_down.load(Ordering::SeqCst) {
            self.rejected.fetch_add(1, Ordering::SeqCst);
            warn!(task = task.id, "cluster is shut down, dropping task");
            return;
        }

        let workers = self.snapshot();
        let Some((idx, observed)) = least_loaded(workers.iter().map(|w| w.load())) else {
            return;
        };
        let chosen = &workers[idx];

        chosen.enqueue(task);
        self.submitted.fetch_add(1, Ordering::SeqCst);
        debug!(
            worker = chosen.id(),
            task = task.id,
            priority = task.priority,
            "task dispatched"
        );

        // The chosen worker's load after this enqueue, as seen by this scan.
        let load_after = observed + 1;
        if load_after as f64 > self.config.scale_trigger() && self.may_scale() {
            self.evaluate_load();
        }
    }

    /// Lock-free pre-check; `evaluate_load` re-checks under the scale lock.
    fn may_scale(&self) -> bool {
        match self.config.autoscale {
            AutoscaleMode::Disabled => false,
            AutoscaleMode::Once => !self.scaled.load(Ordering::SeqCst),
            AutoscaleMode::Repeating => true,
        }
    }
}
