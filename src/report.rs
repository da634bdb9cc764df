// src/report.rs

//! Reporter seam and summary persistence.
//!
//! The aggregator produces a [`Summary`]; anything rendered from it (HTML,
//! Markdown, dashboards) is a reporter concern layered on top. The core
//! ships one plain-text reporter and the JSON persistence of the summary,
//! nothing richer.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::engine::aggregate::Summary;
use crate::errors::Result;

/// Renders an aggregated session summary in some output format.
pub trait Reporter {
    fn render(&self, summary: &Summary) -> Result<()>;
}

/// Uncolored per-task table on stdout.
pub struct PlainReporter;

impl Reporter for PlainReporter {
    fn render(&self, summary: &Summary) -> Result<()> {
        for task in &summary.tasks {
            println!(
                "{:<24} {:<10} {:>8.2}s",
                task.name,
                format!("{:?}", task.status),
                task.duration_secs
            );
        }
        println!(
            "{} succeeded, {} failed, {} timed out in {:.2}s: {:?}",
            summary.counts.succeeded,
            summary.counts.failed,
            summary.counts.timed_out,
            summary.total_duration_secs,
            summary.overall
        );
        Ok(())
    }
}

/// Persist the summary as pretty-printed JSON, creating parent directories
/// as needed.
pub fn write_summary(summary: &Summary, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_string_pretty(summary)?;
    fs::write(path, json)?;
    info!(path = %path.display(), "session summary written");
    Ok(())
}
