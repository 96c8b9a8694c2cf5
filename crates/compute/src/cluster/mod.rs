//! Cluster -- owns the workers, routes submissions and adds capacity.
//!
//! Split into focused submodules:
//! - `core`: Cluster struct, constructor, status and metrics snapshots
//! - `dispatch`: least-loaded routing for `submit`
//! - `autoscale`: the scale-up decision and worker addition
//! - `shutdown`: stopping every worker and reporting discarded tasks

mod autoscale;
mod core;
mod dispatch;
mod shutdown;

pub use self::autoscale::decide;
pub use self::core::Cluster;
pub use self::dispatch::least_loaded;
