//! Self-scaling worker pool: per-worker priority queues, least-loaded
//! dispatch and a load-triggered scale-up.

pub mod cluster;
pub mod executor;
pub mod metrics;
pub mod types;
pub mod worker;

#[cfg(test)]
mod testing;

pub use cluster::Cluster;
pub use executor::{ExecuteError, SimulatedExecutor, TaskExecutor};
pub use herd_core::{AutoscaleMode, ClusterConfig, HerdError, Task, TaskId, WorkerId};
pub use metrics::{ClusterMetrics, ScaleEvent, WorkerMetrics};
pub use types::{ScaleState, ScalingDecision, ShutdownReport, WorkerShutdown, WorkerStatus};
pub use worker::Worker;
