use std::path::Path;

use anyhow::{Context, Result};
use herd_core::ClusterConfig;
use tracing::debug;

use crate::cli::CliArgs;

const DEFAULT_CONFIG_PATH: &str = "herd.toml";

/// Build the cluster config: file (or defaults), `HERD_*` env, then flags.
pub fn resolve(args: &CliArgs) -> Result<ClusterConfig> {
    let mut config = match args.config.as_deref() {
        Some(path) => ClusterConfig::from_file(path)
            .with_context(|| format!("failed to load config from {path}"))?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            debug!(path = DEFAULT_CONFIG_PATH, "using default config file");
            ClusterConfig::from_file(DEFAULT_CONFIG_PATH)
                .with_context(|| format!("failed to load config from {DEFAULT_CONFIG_PATH}"))?
        }
        None => ClusterConfig::from_toml("").context("invalid config from environment")?,
    };

    apply_flags(&mut config, args);
    config.validate().context("invalid cluster config")?;
    Ok(config)
}

fn apply_flags(config: &mut ClusterConfig, args: &CliArgs) {
    if let Some(n) = args.workers {
        config.initial_workers = n;
    }
    if let Some(t) = args.threshold {
        config.load_threshold = t;
    }
    if let Some(mode) = args.autoscale {
        config.autoscale = mode;
    }
    if let Some(ms) = args.idle_ms {
        config.idle_interval_ms = ms;
    }
    if let Some(ms) = args.work_min_ms {
        config.work_min_ms = ms;
    }
    if let Some(ms) = args.work_max_ms {
        config.work_max_ms = ms;
    }
}
