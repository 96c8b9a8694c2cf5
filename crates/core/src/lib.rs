pub mod config;
pub mod error;
pub mod task;

pub use config::{AutoscaleMode, ClusterConfig};
pub use error::*;
pub use task::*;
