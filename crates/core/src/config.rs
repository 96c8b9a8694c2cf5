use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::HerdError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// How often the cluster may add capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoscaleMode {
    /// At most one scale-up over the cluster lifetime.
    #[default]
    Once,
    /// Re-evaluate after every scale-up. Deviates from the single-shot policy.
    Repeating,
    /// Never add workers.
    Disabled,
}

impl std::str::FromStr for AutoscaleMode {
    type Err = HerdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "once" => Ok(Self::Once),
            "repeating" => Ok(Self::Repeating),
            "disabled" => Ok(Self::Disabled),
            other => Err(HerdError::Config(format!(
                "invalid autoscale mode '{other}', expected 'once', 'repeating' or 'disabled'"
            ))),
        }
    }
}

// ── Cluster config ──────────────────────────────────────────────────

/// Tunables for a compute cluster.
///
/// Parsed from `herd.toml` with support for `HERD_*` environment overrides.
/// All values are fixed for the lifetime of a cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Number of workers started at construction.
    #[serde(default = "default_initial_workers")]
    pub initial_workers: usize,

    /// Fraction in (0, 1]; scale-up happens once average load exceeds
    /// `load_threshold * initial_workers`.
    #[serde(default = "default_load_threshold")]
    pub load_threshold: f64,

    /// How long an idle worker waits before polling its queue again.
    #[serde(default = "default_idle_interval_ms")]
    pub idle_interval_ms: u64,

    /// Lower bound of the simulated execution time.
    #[serde(default = "default_work_min_ms")]
    pub work_min_ms: u64,

    /// Upper bound of the simulated execution time.
    #[serde(default = "default_work_max_ms")]
    pub work_max_ms: u64,

    #[serde(default)]
    pub autoscale: AutoscaleMode,
}

fn default_initial_workers() -> usize { 5 }
fn default_load_threshold() -> f64 { 0.8 }
fn default_idle_interval_ms() -> u64 { 100 }
fn default_work_min_ms() -> u64 { 100 }
fn default_work_max_ms() -> u64 { 300 }

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            initial_workers: default_initial_workers(),
            load_threshold: default_load_threshold(),
            idle_interval_ms: default_idle_interval_ms(),
            work_min_ms: default_work_min_ms(),
            work_max_ms: default_work_max_ms(),
            autoscale: AutoscaleMode::default(),
        }
    }
}

impl ClusterConfig {
    /// Config with the two core tunables set and everything else defaulted.
    pub fn new(initial_workers: usize, load_threshold: f64) -> Self {
        Self {
            initial_workers,
            load_threshold,
            ..Self::default()
        }
    }

    /// Parse config from a TOML string, apply env overrides, then validate.
    pub fn from_toml(toml_str: &str) -> Result<Self, HerdError> {
        let mut config: Self = toml::from_str(toml_str)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, HerdError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Average-load level above which the cluster adds a worker.
    pub fn scale_trigger(&self) -> f64 {
        self.load_threshold * self.initial_workers as f64
    }

    pub fn idle_interval(&self) -> Duration {
        Duration::from_millis(self.idle_interval_ms)
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!(
            initial_workers = self.initial_workers,
            load_threshold = self.load_threshold,
            idle_interval_ms = self.idle_interval_ms,
            work_ms = %format!("{}..={}", self.work_min_ms, self.work_max_ms),
            autoscale = ?self.autoscale,
            "cluster config loaded"
        );
    }

    // ── Environment variable overrides ──────────────────────────────

    /// Apply environment variable overrides.
    ///
    /// - `HERD_INITIAL_WORKERS` → `initial_workers`
    /// - `HERD_LOAD_THRESHOLD` → `load_threshold`
    /// - `HERD_IDLE_INTERVAL_MS` → `idle_interval_ms`
    /// - `HERD_WORK_MIN_MS` / `HERD_WORK_MAX_MS` → work bounds
    /// - `HERD_AUTOSCALE` → `autoscale`
    fn apply_env_overrides(&mut self) -> Result<(), HerdError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    pub(crate) fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), HerdError> {
        if let Some(v) = lookup("HERD_INITIAL_WORKERS") {
            self.initial_workers = parse_override("HERD_INITIAL_WORKERS", &v)?;
        }
        if let Some(v) = lookup("HERD_LOAD_THRESHOLD") {
            self.load_threshold = parse_override("HERD_LOAD_THRESHOLD", &v)?;
        }
        if let Some(v) = lookup("HERD_IDLE_INTERVAL_MS") {
            self.idle_interval_ms = parse_override("HERD_IDLE_INTERVAL_MS", &v)?;
        }
        if let Some(v) = lookup("HERD_WORK_MIN_MS") {
            self.work_min_ms = parse_override("HERD_WORK_MIN_MS", &v)?;
        }
        if let Some(v) = lookup("HERD_WORK_MAX_MS") {
            self.work_max_ms = parse_override("HERD_WORK_MAX_MS", &v)?;
        }
        if let Some(v) = lookup("HERD_AUTOSCALE") {
            self.autoscale = v.parse()?;
        }
        Ok(())
    }

    // ── Validation ──────────────────────────────────────────────────

    /// Reject configurations a cluster cannot be built from.
    pub fn validate(&self) -> Result<(), HerdError> {
        if self.initial_workers < 1 {
            return Err(HerdError::InvalidWorkerCount(self.initial_workers));
        }
        // NaN fails both comparisons.
        if !(self.load_threshold > 0.0 && self.load_threshold <= 1.0) {
            return Err(HerdError::InvalidThreshold(self.load_threshold));
        }
        if self.work_min_ms > self.work_max_ms {
            return Err(HerdError::Config(format!(
                "work_min_ms ({}) exceeds work_max_ms ({})",
                self.work_min_ms, self.work_max_ms
            )));
        }
        Ok(())
    }
}

fn parse_override<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, HerdError> {
    value
        .trim()
        .parse()
        .map_err(|_| HerdError::Config(format!("invalid value '{value}' for {key}")))
}
