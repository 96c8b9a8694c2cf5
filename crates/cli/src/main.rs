mod cli;
mod config;
mod status;
mod workload;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use herd_compute::{Cluster, SimulatedExecutor};
use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::status::Reporter;
use crate::workload::Workload;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only status output.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    herd_core::config::load_dotenv();
    let args = CliArgs::parse();

    let config = config::resolve(&args)?;
    config.log_summary();

    let executor = Arc::new(SimulatedExecutor::from_config(&config));
    let cluster = Arc::new(Cluster::new(config, executor).context("failed to start cluster")?);
    let reporter = Reporter::new(args.json);
    let workload = Workload::from_args(&args);
    let cancel = Arc::new(AtomicBool::new(false));

    let mut job = tokio::task::spawn_blocking({
        let cluster = Arc::clone(&cluster);
        let cancel = Arc::clone(&cancel);
        move || workload.run(&cluster, reporter, &cancel)
    });

    tokio::select! {
        res = &mut job => {
            res.context("workload thread panicked")??;
        }
        res = shutdown_signal() => {
            res?;
            warn!("interrupted, stopping cluster");
            cancel.store(true, Ordering::SeqCst);
            cluster.signal_stop();
            job.await.context("workload thread panicked")??;
        }
    }

    let report = cluster.shutdown();
    reporter.summary(&cluster.metrics(), &report)?;

    info!("herd exited cleanly");
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() -> Result<()> {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .context("failed to register SIGTERM handler")?;
        tokio::select! {
            res = ctrl_c => res.context("failed to listen for ctrl_c")?,
            _ = sigterm.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.context("failed to listen for ctrl_c")?;
    }

    Ok(())
}
