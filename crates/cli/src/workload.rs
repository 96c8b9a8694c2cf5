use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use herd_compute::{Cluster, Task};
use rand::Rng;
use tracing::info;

use crate::cli::CliArgs;
use crate::status::Reporter;

/// Sleeps are split into slices this long so cancellation is noticed.
const CANCEL_POLL: Duration = Duration::from_millis(50);

/// Shape of the simulated task stream.
#[derive(Debug, Clone)]
pub struct Workload {
    pub tasks: u64,
    pub priority_max: i64,
    pub status_every: u64,
    pub arrival_min: Duration,
    pub arrival_max: Duration,
    pub settle: Duration,
}

impl Workload {
    pub fn from_args(args: &CliArgs) -> Self {
        let (lo, hi) = ordered(args.arrival_min_ms, args.arrival_max_ms);
        Self {
            tasks: args.tasks,
            priority_max: args.priority_max.max(1),
            status_every: args.status_every,
            arrival_min: Duration::from_millis(lo),
            arrival_max: Duration::from_millis(hi),
            settle: Duration::from_millis(args.settle_ms),
        }
    }

    /// Submit every task, then wait for the settle period.
    ///
    /// Returns early once `cancel` is set. Runs on a blocking thread since
    /// arrivals are paced with `thread::sleep`.
    pub fn run(&self, cluster: &Cluster, reporter: Reporter, cancel: &AtomicBool) -> Result<()> {
        let mut rng = rand::thread_rng();

        for id in 1..=self.tasks {
            if cancel.load(Ordering::SeqCst) {
                info!(submitted = id - 1, "workload cancelled");
                return Ok(());
            }
            let priority = rng.gen_range(1..=self.priority_max);
            cluster.submit(Task::new(id as i64, priority));

            if self.status_every > 0 && id % self.status_every == 0 {
                reporter.status(&format!("after {id} tasks"), &cluster.metrics())?;
            }

            let delay = rng.gen_range(self.arrival_min..=self.arrival_max);
            if !sleep_unless_cancelled(delay, cancel) {
                info!(submitted = id, "workload cancelled");
                return Ok(());
            }
        }

        info!(tasks = self.tasks, settle_ms = self.settle.as_millis() as u64, "all tasks submitted");
        sleep_unless_cancelled(self.settle, cancel);
        reporter.status("final", &cluster.metrics())
    }
}

fn ordered(a: u64, b: u64) -> (u64, u64) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Sleep for `total`, returning `false` if cancelled first.
fn sleep_unless_cancelled(total: Duration, cancel: &AtomicBool) -> bool {
    let deadline = Instant::now() + total;
    loop {
        if cancel.load(Ordering::SeqCst) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep((deadline - now).min(CANCEL_POLL));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use clap::Parser;
    use herd_compute::{ClusterConfig, SimulatedExecutor};

    use super::*;

    #[test]
    fn reversed_arrival_bounds_are_swapped() {
        let args = CliArgs::parse_from(["herd", "--arrival-min-ms", "40", "--arrival-max-ms", "10"]);
        let workload = Workload::from_args(&args);
        assert_eq!(workload.arrival_min, Duration::from_millis(10));
        assert_eq!(workload.arrival_max, Duration::from_millis(40));
    }

    #[test]
    fn cancelled_sleep_returns_immediately() {
        let cancel = AtomicBool::new(true);
        let start = Instant::now();
        assert!(!sleep_unless_cancelled(Duration::from_secs(30), &cancel));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn submits_every_task() {
        let config = ClusterConfig {
            idle_interval_ms: 5,
            work_min_ms: 0,
            work_max_ms: 0,
            ..ClusterConfig::new(2, 0.8)
        };
        let cluster = Cluster::new(config.clone(), Arc::new(SimulatedExecutor::from_config(&config)))
            .unwrap();
        let workload = Workload {
            tasks: 12,
            priority_max: 3,
            status_every: 0,
            arrival_min: Duration::ZERO,
            arrival_max: Duration::ZERO,
            settle: Duration::from_millis(10),
        };

        workload
            .run(&cluster, Reporter::new(true), &AtomicBool::new(false))
            .unwrap();
        assert_eq!(cluster.metrics().submitted, 12);
        cluster.shutdown();
    }

    #[test]
    fn cancelled_workload_submits_nothing() {
        let cluster = Cluster::new(
            ClusterConfig::new(1, 0.8),
            Arc::new(SimulatedExecutor::new(Duration::ZERO, Duration::ZERO)),
        )
        .unwrap();
        let workload = Workload::from_args(&CliArgs::parse_from(["herd"]));

        workload
            .run(&cluster, Reporter::new(false), &AtomicBool::new(true))
            .unwrap();
        assert_eq!(cluster.metrics().submitted, 0);
    }
}
