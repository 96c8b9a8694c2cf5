use std::thread;
use std::time::Duration;

use herd_core::{ClusterConfig, Task, WorkerId};
use rand::Rng;

/// Error type for task execution.
#[derive(Debug, thiserror::Error)]
pub enum ExecuteError {
    #[error("Task failed: {0}")]
    Failed(String),
    #[error("Task aborted: {0}")]
    Aborted(String),
}

/// The effect a worker applies to each task it dequeues.
///
/// Called on the worker's own thread with no locks held. Implementations may
/// block for as long as the work takes; the worker is unavailable meanwhile.
/// A returned error is logged by the worker and never stops its loop.
pub trait TaskExecutor: Send + Sync {
    fn execute(&self, worker: WorkerId, task: &Task) -> Result<(), ExecuteError>;
}

/// Sleeps for a uniformly random duration to stand in for real work.
#[derive(Debug, Clone)]
pub struct SimulatedExecutor {
    min: Duration,
    max: Duration,
}

impl SimulatedExecutor {
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// Uses the config's `work_min_ms..=work_max_ms` range.
    pub fn from_config(config: &ClusterConfig) -> Self {
        Self::new(
            Duration::from_millis(config.work_min_ms),
            Duration::from_millis(config.work_max_ms),
        )
    }

    fn sample(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        rand::thread_rng().gen_range(self.min..=self.max)
    }
}

impl Default for SimulatedExecutor {
    fn default() -> Self {
        Self::from_config(&ClusterConfig::default())
    }
}

impl TaskExecutor for SimulatedExecutor {
    fn execute(&self, _worker: WorkerId, _task: &Task) -> Result<(), ExecuteError> {
        thread::sleep(self.sample());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    #[test]
    fn samples_stay_within_bounds() {
        let exec = SimulatedExecutor::new(Duration::from_millis(2), Duration::from_millis(6));
        for _ in 0..200 {
            let d = exec.sample();
            assert!(d >= Duration::from_millis(2) && d <= Duration::from_millis(6), "{d:?}");
        }
    }

    #[test]
    fn very_long_bounds_sample_without_overflow() {
        let min = Duration::from_millis(u64::MAX - 1);
        let max = Duration::from_millis(u64::MAX);
        let exec = SimulatedExecutor::new(min, max);
        for _ in 0..50 {
            let d = exec.sample();
            assert!(d >= min && d <= max);
        }
    }

    #[test]
    fn swapped_bounds_are_normalised() {
        let exec = SimulatedExecutor::new(Duration::from_millis(9), Duration::from_millis(3));
        assert_eq!(exec.min, Duration::from_millis(3));
        assert_eq!(exec.max, Duration::from_millis(9));
    }

    #[test]
    fn execute_sleeps_at_least_min() {
        let exec = SimulatedExecutor::new(Duration::from_millis(10), Duration::from_millis(10));
        let start = Instant::now();
        exec.execute(1, &Task::new(1, 1)).unwrap();
        assert!(start.elapsed() >= Duration::from_millis(10));
    }

    #[test]
    fn default_uses_reference_range() {
        let exec = SimulatedExecutor::default();
        assert_eq!(exec.min, Duration::from_millis(100));
        assert_eq!(exec.max, Duration::from_millis(300));
    }
}
