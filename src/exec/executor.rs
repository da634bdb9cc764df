// src/exec/executor.rs

//! Individual task execution: one verifier invocation with timeout
//! enforcement and outcome classification.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::dag::TaskId;
use crate::engine::{CompletionEvent, Outcome, TaskName};
use crate::exec::verifier::Verifier;

/// Extra time granted on top of a task's timeout before the verifier future
/// is force-dropped, so tools that self-limit get to exit cleanly.
pub const TIMEOUT_GRACE: Duration = Duration::from_millis(500);

/// One task as handed to a worker: resolved id, name and timeout.
#[derive(Debug, Clone)]
pub struct ScheduledCheck {
    pub id: TaskId,
    pub name: TaskName,
    pub timeout: Option<Duration>,
}

/// Run a single check and report its completion to the scheduler loop.
///
/// Exactly one [`CompletionEvent`] is sent per invocation, whatever happens:
/// verifier errors become `Failed(-1)` so the scheduler never hangs waiting
/// for a worker slot that silently died.
pub async fn run_check<V: Verifier>(
    check: ScheduledCheck,
    verifier: Arc<V>,
    events_tx: mpsc::Sender<CompletionEvent>,
) {
    let started = Instant::now();
    let (outcome, duration, log_path) = execute_classified(&check, verifier, started).await;

    debug!(task = %check.name, ?outcome, "check finished");

    let _ = events_tx
        .send(CompletionEvent {
            task: check.id,
            outcome,
            duration,
            log_path,
        })
        .await;
}

async fn execute_classified<V: Verifier>(
    check: &ScheduledCheck,
    verifier: Arc<V>,
    started: Instant,
) -> (Outcome, Duration, Option<std::path::PathBuf>) {
    let invocation = verifier.execute(&check.name, check.timeout);

    let report = match check.timeout {
        Some(limit) => {
            match tokio::time::timeout(limit + TIMEOUT_GRACE, invocation).await {
                Ok(res) => res,
                Err(_elapsed) => {
                    // Dropping the invocation future terminates the
                    // underlying work (verifier contract), freeing the
                    // worker slot immediately.
                    warn!(
                        task = %check.name,
                        timeout_secs = limit.as_secs(),
                        "task exceeded its timeout; terminating verifier"
                    );
                    return (Outcome::TimedOut, started.elapsed(), None);
                }
            }
        }
        None => invocation.await,
    };

    match report {
        Ok(report) => {
            let outcome = if report.exit_code == 0 {
                Outcome::Succeeded
            } else {
                Outcome::Failed(report.exit_code)
            };
            (outcome, report.duration, report.log_path)
        }
        Err(err) => {
            error!(task = %check.name, error = %err, "verifier invocation error");
            (Outcome::Failed(-1), started.elapsed(), None)
        }
    }
}
