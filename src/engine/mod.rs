// src/engine/mod.rs

//! Orchestration engine for verirun.
//!
//! This module ties together:
//! - the session scheduler loop (bounded workers, ready queue)
//! - the completion events workers send back to that loop
//! - result aggregation into a session summary
//!
//! The pure state transitions live in [`crate::dag::session`]; the async
//! shell that launches workers and consumes completion events is
//! [`scheduler::Scheduler`].

use std::path::PathBuf;
use std::time::Duration;

use crate::dag::TaskId;

/// Canonical task name type used throughout the engine.
pub type TaskName = String;

/// Terminal outcome of one executed task.
///
/// Produced exactly once per task by the executor; tasks failed by cascade
/// never get an `Outcome`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed(i32),
    TimedOut,
}

/// One-way completion notification from a worker to the scheduler loop.
#[derive(Debug)]
pub struct CompletionEvent {
    pub task: TaskId,
    pub outcome: Outcome,
    /// Wall-clock duration of the verifier invocation.
    pub duration: Duration,
    pub log_path: Option<PathBuf>,
}

pub mod aggregate;
pub mod scheduler;

pub use aggregate::{summarize, OverallStatus, StatusCounts, Summary, TaskReport};
pub use scheduler::Scheduler;
