use clap::Parser;
use herd_core::AutoscaleMode;

/// Drive a self-scaling compute cluster with a simulated workload.
///
/// Submits tasks with random priorities at a random arrival rate, prints
/// the per-worker backlog as it goes, then shuts the cluster down and
/// reports what was left unprocessed.
#[derive(Parser, Debug)]
#[command(name = "herd", about = "Self-scaling compute cluster demo")]
pub struct CliArgs {
    /// Path to a TOML config file (default: ./herd.toml if present)
    #[arg(long)]
    pub config: Option<String>,

    /// Number of workers to start with
    #[arg(long)]
    pub workers: Option<usize>,

    /// Load threshold in (0, 1]
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Autoscale policy: once, repeating or disabled
    #[arg(long)]
    pub autoscale: Option<AutoscaleMode>,

    /// Idle poll interval of each worker, in milliseconds
    #[arg(long)]
    pub idle_ms: Option<u64>,

    /// Lower bound of simulated task execution time, in milliseconds
    #[arg(long)]
    pub work_min_ms: Option<u64>,

    /// Upper bound of simulated task execution time, in milliseconds
    #[arg(long)]
    pub work_max_ms: Option<u64>,

    /// Number of tasks to submit
    #[arg(long, default_value = "30")]
    pub tasks: u64,

    /// Priorities are drawn from 1..=priority-max (lower runs first)
    #[arg(long, default_value = "5")]
    pub priority_max: i64,

    /// Print cluster status after every N submissions (0 disables)
    #[arg(long, default_value = "5")]
    pub status_every: u64,

    /// Minimum delay between submissions, in milliseconds
    #[arg(long, default_value = "200")]
    pub arrival_min_ms: u64,

    /// Maximum delay between submissions, in milliseconds
    #[arg(long, default_value = "500")]
    pub arrival_max_ms: u64,

    /// How long to let workers drain before shutting down, in milliseconds
    #[arg(long, default_value = "2000")]
    pub settle_ms: u64,

    /// Print status snapshots and the summary as JSON lines
    #[arg(long)]
    pub json: bool,
}
