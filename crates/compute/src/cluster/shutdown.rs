use std::sync::atomic::Ordering;
use std::sync::PoisonError;

use tracing::{info, warn};

use crate::types::{ShutdownReport, WorkerShutdown};

use super::Cluster;

impl Cluster {
    /// Refuse further submissions and ask every worker to stop, without
    /// waiting for them.
    pub fn signal_stop(&self) {
        {
            // Serialises with `evaluate_load`, so no worker is appended after
            // the snapshot below.
            let _scale = self.scale.lock().unwrap_or_else(PoisonError::into_inner);
            self.shut_down.store(true, Ordering::SeqCst);
        }
        for worker in self.snapshot() {
            worker.request_stop();
        }
    }

    /// Stop every worker and discard all queued tasks.
    ///
    /// All workers are signalled before any is joined, so total latency is
    /// about one idle interval or the longest in-flight task, not their sum.
    /// Queued tasks are dropped, never drained or replayed. A repeated call
    /// finds nothing left to discard.
    pub fn shutdown(&self) -> ShutdownReport {
        self.signal_stop();

        let workers = self.snapshot();
        let report = ShutdownReport {
            workers: workers
                .iter()
                .map(|w| WorkerShutdown {
                    worker_id: w.id(),
                    discarded: w.stop(),
                })
                .collect(),
        };

        if self.joined.swap(true, Ordering::SeqCst) {
            return report;
        }
        let discarded = report.total_discarded();
        if discarded > 0 {
            warn!(discarded, "cluster stopped with queued tasks discarded");
        }
        info!(workers = workers.len(), "cluster stopped");
        report
    }
}

impl Drop for Cluster {
    fn drop(&mut self) {
        self.shutdown();
    }
}
