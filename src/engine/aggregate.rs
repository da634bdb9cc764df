// src/engine/aggregate.rs

//! Session result aggregation.
//!
//! Turns a finished [`ExecutionSession`] into a stable, serializable
//! [`Summary`]. No formatting happens here; rendering is a reporter concern.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::dag::{ExecutionSession, TaskStatus};
use crate::engine::Outcome;
use crate::errors::{Result, VerirunError};

/// Overall verdict of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Success,
    Failure,
    Timeout,
}

impl OverallStatus {
    /// Process exit code for CLI use. Configuration errors use a distinct
    /// code assigned in `main`.
    pub fn exit_code(self) -> u8 {
        match self {
            OverallStatus::Success => 0,
            OverallStatus::Failure => 1,
            OverallStatus::Timeout => 2,
        }
    }
}

/// Task counts per terminal status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub succeeded: usize,
    pub failed: usize,
    pub timed_out: usize,
}

/// One task's record in the persisted summary.
#[derive(Debug, Clone, Serialize)]
pub struct TaskReport {
    pub name: String,
    pub status: TaskStatus,
    pub duration_secs: f64,
    pub depends_on: Vec<String>,
    /// Exit code of the verifier invocation; absent for cascaded failures
    /// and timeouts, which have no exit status.
    pub exit_code: Option<i32>,
    pub log_path: Option<PathBuf>,
}

/// The sole structured artifact the orchestrator commits to disk.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub overall: OverallStatus,
    pub counts: StatusCounts,
    pub total_duration_secs: f64,
    /// Per-task records in execution order.
    pub tasks: Vec<TaskReport>,
}

/// Aggregate a finished session.
///
/// The overall verdict is computed over the requested tasks: `Failure` if
/// any of them failed (including by cascade), else `Timeout` if any timed
/// out, else `Success`. Counts still cover every task in the session.
///
/// Fails with [`VerirunError::Inconsistency`] if any session task is not
/// terminal; the scheduler guarantees that on its success path.
pub fn summarize(session: &ExecutionSession, total_duration: Duration) -> Result<Summary> {
    let graph = session.graph();
    let mut counts = StatusCounts::default();
    let mut tasks = Vec::with_capacity(session.order().len());

    for &id in session.order() {
        let name = graph.name_of(id).to_string();
        let slot = session.slot(id).ok_or_else(|| {
            VerirunError::Inconsistency(format!("task '{name}' has no session slot"))
        })?;

        match slot.status {
            TaskStatus::Succeeded => counts.succeeded += 1,
            TaskStatus::Failed => counts.failed += 1,
            TaskStatus::TimedOut => counts.timed_out += 1,
            status => {
                return Err(VerirunError::Inconsistency(format!(
                    "task '{name}' is not terminal at aggregation time ({status:?})"
                )));
            }
        }

        let exit_code = match slot.outcome {
            Some(Outcome::Succeeded) => Some(0),
            Some(Outcome::Failed(code)) => Some(code),
            Some(Outcome::TimedOut) | None => None,
        };

        tasks.push(TaskReport {
            name,
            status: slot.status,
            duration_secs: slot.duration.unwrap_or_default().as_secs_f64(),
            depends_on: graph
                .dependencies_of(id)
                .iter()
                .map(|&dep| graph.name_of(dep).to_string())
                .collect(),
            exit_code,
            log_path: slot.log_path.clone(),
        });
    }

    let requested_has = |status: TaskStatus| {
        session
            .requested()
            .iter()
            .any(|&id| session.status_of(id) == Some(status))
    };
    let overall = if requested_has(TaskStatus::Failed) {
        OverallStatus::Failure
    } else if requested_has(TaskStatus::TimedOut) {
        OverallStatus::Timeout
    } else {
        OverallStatus::Success
    };

    Ok(Summary {
        overall,
        counts,
        total_duration_secs: total_duration.as_secs_f64(),
        tasks,
    })
}
