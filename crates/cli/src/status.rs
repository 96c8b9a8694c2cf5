use anyhow::Result;
use herd_compute::{ClusterMetrics, ShutdownReport};
use serde_json::json;

/// Prints cluster snapshots either as a table or as JSON lines.
#[derive(Debug, Clone, Copy)]
pub struct Reporter {
    json: bool,
}

impl Reporter {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn status(&self, label: &str, metrics: &ClusterMetrics) -> Result<()> {
        if self.json {
            let line = json!({ "event": "status", "label": label, "metrics": metrics });
            println!("{}", serde_json::to_string(&line)?);
        } else {
            print!("{}", render_table(label, metrics));
        }
        Ok(())
    }

    pub fn summary(&self, metrics: &ClusterMetrics, report: &ShutdownReport) -> Result<()> {
        if self.json {
            let line = json!({
                "event": "summary",
                "submitted": metrics.submitted,
                "rejected": metrics.rejected,
                "completed": metrics.total_completed(),
                "discarded": report.total_discarded(),
                "workers": metrics.worker_count(),
                "scale_events": metrics.scale_events,
                "shutdown": report,
            });
            println!("{}", serde_json::to_string(&line)?);
        } else {
            println!("{}", render_summary(metrics, report));
        }
        Ok(())
    }
}

fn render_table(label: &str, metrics: &ClusterMetrics) -> String {
    let mut out = format!(
        "Cluster status ({label}): {} workers, average load {:.2}\n",
        metrics.worker_count(),
        metrics.average_load()
    );
    for w in &metrics.workers {
        out.push_str(&format!(
            "  Worker {}: {} tasks queued, {} completed\n",
            w.worker_id, w.load, w.completed
        ));
    }
    out
}

fn render_summary(metrics: &ClusterMetrics, report: &ShutdownReport) -> String {
    format!(
        "summary: submitted={} completed={} discarded={} rejected={} workers={} scale_events={}",
        metrics.submitted,
        metrics.total_completed(),
        report.total_discarded(),
        metrics.rejected,
        metrics.worker_count(),
        metrics.scale_events.len()
    )
}
